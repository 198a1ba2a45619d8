//! Property tests: compiled plans preserve the duration of the timer tree

use pomoedit::plan::{DEFAULT_LOOP_CAP, MAX_PLAN_ENTRIES, compile};
use pomoedit::syntax::{Node, parse_syntax, tokenize};
use proptest::prelude::*;

/// A timer tree together with the text that declares it
#[derive(Debug, Clone)]
struct Expr {
    text: String,
    seconds: u64,
    leaves: usize,
    /// Entries in the fully expanded plan
    entries: u64,
}

fn leaf() -> impl Strategy<Value = Expr> {
    let unit = prop_oneof![Just(("s", 1u64)), Just(("m", 60)), Just(("h", 3600)), Just(("p", 60))];
    let symbol = prop_oneof![Just(""), Just("🍅"), Just("☕"), Just("x")];
    (0u64..100, unit, symbol).prop_map(|(n, (unit, scale), symbol)| {
        let text = if unit == "p" {
            format!("p{}{}", n, symbol)
        } else {
            format!("{}{}{}", n, unit, symbol)
        };
        Expr {
            text,
            seconds: n * scale,
            leaves: 1,
            entries: 1,
        }
    })
}

fn sequence(items: Vec<Expr>) -> Expr {
    Expr {
        text: items.iter().map(|e| e.text.as_str()).collect::<Vec<_>>().join(" "),
        seconds: items.iter().map(|e| e.seconds).sum(),
        leaves: items.iter().map(|e| e.leaves).sum(),
        entries: items.iter().map(|e| e.entries).sum(),
    }
}

fn expr() -> impl Strategy<Value = Expr> {
    leaf().prop_recursive(4, 24, 4, |inner| {
        (prop::collection::vec(inner, 1..4), prop::option::weighted(0.8, 1u32..4)).prop_map(|(children, count)| {
            let body = sequence(children);
            let repeats = count.unwrap_or(DEFAULT_LOOP_CAP);
            Expr {
                text: match count {
                    Some(n) => format!("({}){}", body.text, n),
                    None => format!("({})", body.text),
                },
                seconds: body.seconds * u64::from(repeats),
                leaves: body.leaves,
                entries: body.entries * u64::from(repeats),
            }
        })
    })
}

fn program() -> impl Strategy<Value = Expr> {
    prop::collection::vec(expr(), 1..4).prop_map(sequence)
}

proptest! {
    #[test]
    fn test_plan_duration_matches_tree(program in program()) {
        let nodes = parse_syntax(&program.text);
        prop_assert!(!tokenize(&program.text).is_empty());
        let plan = compile(&nodes);
        if program.entries <= MAX_PLAN_ENTRIES as u64 {
            prop_assert_eq!(plan.len() as u64, program.entries);
            prop_assert_eq!(plan.total_seconds(), program.seconds);
            prop_assert!(!plan.is_truncated());
        } else {
            prop_assert_eq!(plan.len(), MAX_PLAN_ENTRIES);
            prop_assert!(plan.is_truncated());
        }
    }

    #[test]
    fn test_tree_preserves_leaves(program in program()) {
        let nodes = parse_syntax(&program.text);
        let leaves: usize = nodes.iter().map(Node::leaf_count).sum();
        prop_assert_eq!(leaves, program.leaves);
        let total: u64 = nodes.iter().map(|n| n.total_seconds(DEFAULT_LOOP_CAP)).sum();
        prop_assert_eq!(total, program.seconds);
    }

    #[test]
    fn test_first_entry_never_steps(program in program()) {
        let plan = compile(&parse_syntax(&program.text));
        prop_assert!(!plan.announces_step(0));
    }

    #[test]
    fn test_tokenize_never_panics(input in "\\PC{0,40}") {
        let _ = tokenize(&input);
        let _ = parse_syntax(&input);
    }
}
