//! Rule invocation strings: parsing and dispatch.
//!
//! An invocation is `name` or `name:key=value,key=value`. The name is
//! matched as a prefix against the rule table and every matching rule runs,
//! in table order, so `p` runs `pagination`, `posts` and `pages`.
//!
//! Failure handling is deliberately asymmetric. An unknown name is logged and
//! remembered, but the remaining invocations still run, and a later success
//! clears the remembered error. A rule that fails stops everything at once.

use crate::context::BuildContext;
use crate::rules::{Engine, RuleArgs, RuleError};
use tracing::{error, warn};

/// Parse an argument block, colon included.
///
/// Returns `None` when the block is malformed: it does not start with `:`,
/// or a pair after the colon (or after a comma) has no `=`. A trailing comma
/// counts as an empty pair and is malformed too.
pub fn parse_args(block: &str) -> Option<RuleArgs> {
    let mut rest = block.strip_prefix(':')?;
    let mut args = RuleArgs::new();
    loop {
        let (key, tail) = rest.split_once('=')?;
        match tail.split_once(',') {
            Some((value, next)) => {
                args.insert(key.to_string(), value.to_string());
                rest = next;
            }
            None => {
                args.insert(key.to_string(), tail.to_string());
                return Some(args);
            }
        }
    }
}

/// Split an invocation into the rule name and its arguments. Malformed
/// argument blocks are dropped with a warning.
pub fn parse_invocation(invocation: &str) -> (&str, RuleArgs) {
    let Some(colon) = invocation.find(':') else {
        return (invocation, RuleArgs::new());
    };
    let (name, block) = invocation.split_at(colon);
    let args = parse_args(block).unwrap_or_else(|| {
        warn!(invocation, "failed to parse rule arguments, ignoring");
        RuleArgs::new()
    });
    (name, args)
}

/// Run every invocation in order.
///
/// Returns the first error raised by a rule that ran. Otherwise returns the
/// outcome of the last invocation: `Ok` when it matched at least one rule,
/// [`RuleError::NotFound`] when it matched none.
pub fn dispatch<S: AsRef<str>>(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    invocations: &[S],
) -> Result<(), RuleError> {
    let mut status = Ok(());
    for invocation in invocations {
        let (name, args) = parse_invocation(invocation.as_ref());

        let mut found = false;
        for rule in engine.table.matching(name) {
            found = true;
            engine.execute(ctx, rule, &args)?;
            status = Ok(());
        }
        if !found {
            error!(rule = name, "rule not found");
            status = Err(RuleError::NotFound(name.to_string()));
        }
    }
    status
}
