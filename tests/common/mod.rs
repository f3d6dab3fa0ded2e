//! Generators shared by the integration tests.
//!
//! Every tree walker takes one path through the decision tree it describes
//! and returns the number of the leaf it reached. Leaf numbers are dense in
//! `0..leaves`.
#![allow(dead_code)]

use tree_guide::Chooser;

pub struct StandardTree {
    pub name: &'static str,
    pub leaves: u64,
    pub walk: fn(&mut dyn Chooser) -> u64,
}

pub fn standard_trees() -> Vec<StandardTree> {
    vec![
        StandardTree {
            name: "maximally unbalanced",
            leaves: 16 * 4 + 17,
            walk: maximally_unbalanced,
        },
        StandardTree {
            name: "full binary",
            leaves: 64,
            walk: full_tree,
        },
        StandardTree {
            name: "right skewed",
            leaves: 6 * 7 / 2 + 1,
            walk: right_skewed,
        },
        StandardTree {
            name: "path with thickets",
            leaves: 50,
            walk: path_with_thickets,
        },
        StandardTree {
            name: "increasing degree",
            leaves: 720,
            walk: increasing_degree,
        },
        StandardTree {
            name: "decreasing degree",
            leaves: 720,
            walk: decreasing_degree,
        },
    ]
}

/// 17-ary tree where only the last branch at each level goes deeper
fn maximally_unbalanced(c: &mut dyn Chooser) -> u64 {
    const BRANCH: u64 = 17;
    let mut number = 0;
    for _ in 0..5 {
        let choice = c.choose(BRANCH);
        if choice != BRANCH - 1 {
            return number + choice;
        }
        number += BRANCH - 1;
    }
    number
}

fn full_tree(c: &mut dyn Chooser) -> u64 {
    (0..6).fold(0, |number, _| 2 * number + c.choose(2))
}

fn right_skewed(c: &mut dyn Chooser) -> u64 {
    fn left(c: &mut dyn Chooser, depth: u64, number: u64) -> u64 {
        if depth == 0 || c.choose(2) == 1 {
            return number;
        }
        left(c, depth - 1, number + 1)
    }
    fn right(c: &mut dyn Chooser, depth: u64, number: u64) -> u64 {
        if depth == 0 {
            return number;
        }
        if c.choose(2) == 0 {
            return left(c, depth - 1, number);
        }
        right(c, depth - 1, number + depth)
    }
    right(c, 6, 0)
}

/// A long zig-zagging path with small complete bushes hanging off it
fn path_with_thickets(c: &mut dyn Chooser) -> u64 {
    fn bush(c: &mut dyn Chooser, size: u64, number: u64) -> u64 {
        if size == 1 {
            return number;
        }
        let large = size / 2;
        if c.choose(2) == 0 {
            bush(c, large, number)
        } else {
            bush(c, size - large, number + large)
        }
    }
    fn path(c: &mut dyn Chooser, size: u64, number: u64, bush_size: u64, bush_left: bool) -> u64 {
        if size <= bush_size {
            return bush(c, size, number);
        }
        if bush_left {
            if c.choose(2) == 0 {
                bush(c, bush_size, number)
            } else {
                path(c, size - bush_size, number + bush_size, bush_size, false)
            }
        } else if c.choose(2) == 1 {
            bush(c, bush_size, number + size - bush_size)
        } else {
            path(c, size - bush_size, number, bush_size, true)
        }
    }
    path(c, 50, 0, 8, true)
}

fn increasing_degree(c: &mut dyn Chooser) -> u64 {
    (1..=6).fold(0, |number, degree| degree * number + c.choose(degree))
}

fn decreasing_degree(c: &mut dyn Chooser) -> u64 {
    (1..=6).rev().fold(0, |number, degree| degree * number + c.choose(degree))
}

/// Random regular expression, one scope per production
pub fn regex(c: &mut dyn Chooser, depth: u64) -> String {
    c.begin_scope();
    let s = production(c, depth);
    c.end_scope();
    s
}

fn character(c: &mut dyn Chooser) -> String {
    ["a", "b", "c", "d", "."][c.choose(5) as usize].to_string()
}

fn num(c: &mut dyn Chooser, min: u64, max: u64) -> u64 {
    min + c.choose(max - min)
}

fn production(c: &mut dyn Chooser, depth: u64) -> String {
    let depth = depth.saturating_sub(1);
    if depth == 0 {
        return character(c);
    }
    match c.choose(11) {
        0 => character(c),
        1 => {
            let a = regex(c, depth);
            let b = regex(c, depth);
            format!("{}|{}", a, b)
        }
        2 => format!("({})", regex(c, depth)),
        3 => {
            let a = regex(c, depth);
            let b = regex(c, depth);
            a + &b
        }
        4 => regex(c, depth) + "?",
        5 => regex(c, depth) + "*",
        6 => regex(c, depth) + "+",
        7 => {
            let body = regex(c, depth);
            format!("{}{{{}}}", body, num(c, 1, 5))
        }
        8 => {
            let body = regex(c, depth);
            format!("{}{{{},}}", body, num(c, 1, 5))
        }
        9 => {
            let body = regex(c, depth);
            format!("{}{{,{}}}", body, num(c, 1, 5))
        }
        _ => {
            let n = num(c, 0, 5);
            let body = regex(c, depth);
            format!("{}{{{},{}}}", body, n, n + num(c, 0, 4))
        }
    }
}

/// Depth used for the `i`th regex of a batch
pub fn regex_depth(i: u64) -> u64 {
    1 + i % 10
}
