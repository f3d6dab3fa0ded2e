//! Statistical checks of how often the weighted sampler picks each outcome

use tree_guide::{Chooser, Guide, WeightedSamplerGuide};

const REPS: usize = 2000;

fn frequencies(seed: u64, outcome: impl Fn(&mut dyn Chooser) -> usize) -> Vec<f64> {
    let mut guide = WeightedSamplerGuide::new(seed);
    let mut counts = Vec::new();
    for _ in 0..REPS {
        let mut chooser = guide.make_chooser().unwrap().unwrap();
        let i = outcome(chooser.as_mut());
        chooser.finish().unwrap();
        if i >= counts.len() {
            counts.resize(i + 1, 0usize);
        }
        counts[i] += 1;
    }
    counts.into_iter().map(|n| n as f64 / REPS as f64).collect()
}

#[test]
fn test_unbalanced_flip_tree_is_balanced_by_size() {
    let freq = frequencies(1, |c| {
        if c.flip() {
            0
        } else if c.flip() {
            1
        } else {
            2
        }
    });
    assert_eq!(freq.len(), 3);
    for f in freq {
        assert!(f >= 0.3, "{}", f);
    }
}

#[test]
fn test_uniform_weights() {
    let freq = frequencies(2, |c| c.choose_weighted(&[1.0, 1.0, 1.0]) as usize);
    for f in freq {
        assert!(f >= 0.3, "{}", f);
    }
}

#[test]
fn test_non_uniform_weights_are_respected() {
    let freq = frequencies(3, |c| c.choose_weighted(&[0.6, 0.2, 0.2]) as usize);
    assert!(freq[0] >= 0.5, "{:?}", freq);
    assert!(freq[1] >= 0.1, "{:?}", freq);
    assert!(freq[2] >= 0.1, "{:?}", freq);
}

#[test]
fn test_non_uniform_weights_with_follow_on_choices() {
    let freq = frequencies(4, |c| {
        let result = c.choose_weighted(&[0.6, 0.2, 0.2]) as usize;
        c.flip();
        c.flip();
        result
    });
    assert!(freq[0] >= 0.5, "{:?}", freq);
    assert!(freq[1] >= 0.1, "{:?}", freq);
    assert!(freq[2] >= 0.1, "{:?}", freq);
}

#[test]
fn test_integer_counts_behave_like_weights() {
    let freq = frequencies(5, |c| c.choose_weighted_counts(&[6, 2, 2]) as usize);
    assert!(freq[0] >= 0.5, "{:?}", freq);
    assert!(freq[1] >= 0.1, "{:?}", freq);
    assert!(freq[2] >= 0.1, "{:?}", freq);
}

#[test]
fn test_weights_are_combined_with_subtree_size() {
    // expected about [0.5, 0.25, 0.25]
    let freq = frequencies(6, |c| {
        if c.choose_weighted(&[2.0 / 3.0, 4.0 / 3.0]) == 1 {
            0
        } else if c.flip() {
            1
        } else {
            2
        }
    });
    assert!(freq[0] >= 0.4, "{:?}", freq);
    assert!(freq[1] >= 0.2, "{:?}", freq);
    assert!(freq[2] >= 0.2, "{:?}", freq);
}
