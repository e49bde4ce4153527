use serde::{Deserialize, Serialize};

use crate::args::{Binning, Diversity};
use crate::tree::{count_segregating_snps, Branch, Side, Tree};

/// Zero recipient diversity is replaced by one and the source diversity is offset by this amount
pub const MAGNITUDE_ZERO_OFFSET: f64 = 100.0;

/// Call of a single heuristic relative to the presumed source -> recipient direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Detection {
    pub correct: bool,
    pub reverse: bool,
}

impl Detection {
    pub fn new(correct: bool, reverse: bool) -> Self {
        Self { correct, reverse }
    }

    /// Correct if the source value is larger, reverse if the recipient value is larger
    pub fn compare<T: PartialOrd>(source: T, recipient: T) -> Self {
        Self {
            correct: source > recipient,
            reverse: recipient > source,
        }
    }

    /// Neither direction was called, or both were
    pub fn is_ambiguous(&self) -> bool {
        self.correct == self.reverse
    }

    pub fn or(self, other: Self) -> Self {
        Self {
            correct: self.correct || other.correct,
            reverse: self.reverse || other.reverse,
        }
    }

    /// Any call wins
    pub fn any(detections: impl IntoIterator<Item = Self>) -> Self {
        detections
            .into_iter()
            .fold(Self::default(), |acc, detection| acc.or(detection))
    }

    /// From a signed vote: positive is correct, negative reverse
    pub fn from_sign(vote: i64) -> Self {
        Self::compare(vote, 0)
    }
}

/// Segregating site counts measured within each population's own sample
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segregation {
    pub source: usize,
    pub recipient: usize,
}

impl Segregation {
    pub fn detection(&self) -> Detection {
        Detection::compare(self.source, self.recipient)
    }

    /// Largest counts seen in any of the trees
    pub fn max(counts: impl IntoIterator<Item = Self>) -> Self {
        counts
            .into_iter()
            .fold(Self::default(), |acc, seg| Self {
                source: acc.source.max(seg.source),
                recipient: acc.recipient.max(seg.recipient),
            })
    }
}

/// Segregating sites on the shared branch in the source and in the recipient sample
pub fn check_tier_1(tree: &Tree) -> Segregation {
    Segregation {
        source: count_segregating_snps(Side::Source, &tree.shared),
        recipient: count_segregating_snps(Side::Recipient, &tree.shared),
    }
}

/// Source sample segregation on the recipient's private branch and vice versa
pub fn check_tier_2(tree: &Tree) -> Segregation {
    Segregation {
        source: count_segregating_snps(Side::Source, &tree.recipient),
        recipient: count_segregating_snps(Side::Recipient, &tree.source),
    }
}

/// Count allele frequencies per bin. The bins are `[0, w], (w, 2w], ..., (1 - w, 1]` for the
/// inclusive rule and `(0, w], ...` for the ceiling rule.
pub fn bin_proportions(proportions: &[f64], num_bins: usize, binning: Binning) -> Vec<usize> {
    // NOTE: more bins than the sample size is pointless, proportions move in steps of 1 / n
    if proportions.is_empty() || num_bins == 0 {
        return vec![];
    }

    let bin_size = 1.0 / num_bins as f64;
    let mut binned = vec![0; num_bins];

    for &p in proportions {
        if p <= 0.0 {
            match binning {
                Binning::Inclusive => binned[0] += 1,
                Binning::Ceiling => (),
            }
            continue;
        }

        let idx = ((p / bin_size).ceil() as usize).clamp(1, num_bins) - 1;
        binned[idx] += 1;
    }

    binned
}

/// 1 - (same-bin pairs / all pairs), near one when spread over many bins
pub fn gini_purity(binned: &[usize]) -> f64 {
    let total: usize = binned.iter().sum();
    if binned.len() <= 1 || total <= 1 {
        return 0.0;
    }

    let max_pairs = (total * total - total) as f64;
    let same_bin_pairs = binned.iter().map(|&b| b * b - b).sum::<usize>() as f64;
    1.0 - same_bin_pairs / max_pairs
}

pub fn shannon_entropy(binned: &[usize]) -> f64 {
    let nonempty = binned.iter().filter(|&&b| b > 0).count();
    if nonempty <= 1 {
        return 0.0;
    }

    let total = binned.iter().sum::<usize>() as f64;
    -binned
        .iter()
        .filter(|&&b| b > 0)
        .map(|&b| {
            let p = b as f64 / total;
            p * p.ln()
        })
        .sum::<f64>()
}

impl Diversity {
    pub fn measure(&self, binned: &[usize]) -> f64 {
        match self {
            Diversity::GiniPurity => gini_purity(binned),
            Diversity::Shannon => shannon_entropy(binned),
        }
    }
}

/// Diversity of the source and of the recipient frequencies over the same mutations
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiversityPair {
    pub source: f64,
    pub recipient: f64,
}

impl DiversityPair {
    pub fn detection(&self) -> Detection {
        Detection::compare(self.source, self.recipient)
    }

    /// Source over recipient diversity, a zero recipient diversity gives `source + 100`
    pub fn ratio(&self) -> f64 {
        if self.recipient == 0.0 {
            self.source + MAGNITUDE_ZERO_OFFSET
        } else {
            self.source / self.recipient
        }
    }
}

/// Diversities along both lineages of a tree
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeClumpiness {
    pub ancestral_to_source: DiversityPair,
    pub ancestral_to_recipient: DiversityPair,
}

impl CompositeClumpiness {
    /// A strictly more diverse source on its own lineage and an at least as diverse source on the
    /// recipient's lineage calls correct. The mirror image calls reverse.
    pub fn detection(&self) -> Detection {
        let ats = self.ancestral_to_source;
        let atr = self.ancestral_to_recipient;
        Detection {
            correct: ats.source > ats.recipient && atr.source >= atr.recipient,
            reverse: atr.recipient > atr.source && ats.recipient >= ats.source,
        }
    }
}

/// Binning and diversity settings for the clumpiness statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clumpiness {
    pub num_bins: usize,
    pub binning: Binning,
    pub diversity: Diversity,
}

impl Clumpiness {
    pub fn new(num_bins: usize, binning: Binning, diversity: Diversity) -> Self {
        Self {
            num_bins,
            binning,
            diversity,
        }
    }

    fn side_diversity(&self, branch: &Branch, side: Side) -> f64 {
        let proportions = branch.values().map(|p| p.side(side)).collect::<Vec<f64>>();
        let binned = bin_proportions(&proportions, self.num_bins, self.binning);
        self.diversity.measure(&binned)
    }

    pub fn check_clumpiness(&self, branch: &Branch) -> DiversityPair {
        DiversityPair {
            source: self.side_diversity(branch, Side::Source),
            recipient: self.side_diversity(branch, Side::Recipient),
        }
    }

    pub fn check_clumpiness_composite(&self, tree: &Tree) -> CompositeClumpiness {
        CompositeClumpiness {
            ancestral_to_source: self.check_clumpiness(&tree.ancestral_to_source()),
            ancestral_to_recipient: self.check_clumpiness(&tree.ancestral_to_recipient()),
        }
    }
}

/// Sign of correct minus reverse composite calls over all trees of a trial
pub fn clumpiness_tally(composites: &[CompositeClumpiness]) -> Detection {
    let (correct, reverse) = composites
        .iter()
        .map(CompositeClumpiness::detection)
        .fold((0_i64, 0_i64), |(c, r), d| {
            (c + i64::from(d.correct), r + i64::from(d.reverse))
        });
    Detection::from_sign(correct - reverse)
}

/// Mean source/recipient diversity ratio on both lineages: correct if both exceed one, reverse
/// if neither does.
pub fn clumpiness_magnitude(composites: &[CompositeClumpiness]) -> Detection {
    if composites.is_empty() {
        return Detection::default();
    }

    let n = composites.len() as f64;
    let source_diff = composites
        .iter()
        .map(|c| c.ancestral_to_source.ratio())
        .sum::<f64>()
        / n;
    let recipient_diff = composites
        .iter()
        .map(|c| c.ancestral_to_recipient.ratio())
        .sum::<f64>()
        / n;

    Detection {
        correct: source_diff > 1.0 && recipient_diff > 1.0,
        reverse: source_diff <= 1.0 && recipient_diff <= 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Proportions;

    fn branch(rows: &[(i64, f64, f64)]) -> Branch {
        rows.iter()
            .map(|&(m, s, r)| (m, Proportions::new(s, r)))
            .collect()
    }

    fn clumpiness() -> Clumpiness {
        Clumpiness::new(10, Binning::Inclusive, Diversity::GiniPurity)
    }

    #[test]
    fn test_detection() {
        assert_eq!(Detection::compare(2, 1), Detection::new(true, false));
        assert_eq!(Detection::compare(1, 2), Detection::new(false, true));
        assert!(Detection::compare(1, 1).is_ambiguous());
        assert!(Detection::new(true, true).is_ambiguous());
        assert!(!Detection::new(true, false).is_ambiguous());

        let any = Detection::any([Detection::new(false, false), Detection::new(true, false)]);
        assert_eq!(any, Detection::new(true, false));
        assert_eq!(Detection::any([]), Detection::default());

        assert_eq!(Detection::from_sign(-3), Detection::new(false, true));
        assert_eq!(Detection::from_sign(0), Detection::default());
    }

    #[test]
    fn test_check_tier_1() {
        let mut tree = Tree::default();
        assert_eq!(check_tier_1(&tree), Segregation::default());

        tree.shared = branch(&[(1, 0.5, 1.0), (2, 1.0, 1.0), (3, 0.3, 0.9)]);
        let seg = check_tier_1(&tree);
        assert_eq!(seg, Segregation { source: 2, recipient: 1 });
        assert_eq!(seg.detection(), Detection::new(true, false));

        tree.shared.insert(1, Proportions::new(1.0, 1.0));
        let seg = check_tier_1(&tree);
        assert_eq!(seg, Segregation { source: 1, recipient: 1 });
        assert!(seg.detection().is_ambiguous());

        tree.shared.insert(2, Proportions::new(1.0, 0.4));
        let seg = check_tier_1(&tree);
        assert_eq!(seg, Segregation { source: 1, recipient: 2 });
        assert_eq!(seg.detection(), Detection::new(false, true));
    }

    #[test]
    fn test_check_tier_2() {
        let mut tree = Tree::default();
        assert_eq!(check_tier_2(&tree), Segregation::default());

        tree.source = branch(&[(1, 0.5, 1.0), (2, 1.0, 1.0), (3, 0.8, 1.0)]);
        tree.recipient = branch(&[(4, 0.5, 1.0), (5, 1.0, 1.0), (6, 1.0, 0.9)]);
        assert_eq!(check_tier_2(&tree), Segregation { source: 1, recipient: 0 });

        tree.recipient.insert(4, Proportions::new(1.0, 1.0));
        assert_eq!(check_tier_2(&tree), Segregation { source: 0, recipient: 0 });

        tree.source.insert(1, Proportions::new(0.5, 0.9));
        tree.recipient.insert(4, Proportions::new(0.5, 1.0));
        assert_eq!(check_tier_2(&tree), Segregation { source: 1, recipient: 1 });

        tree.source.insert(2, Proportions::new(1.0, 0.5));
        let seg = check_tier_2(&tree);
        assert_eq!(seg, Segregation { source: 1, recipient: 2 });
        assert_eq!(seg.detection(), Detection::new(false, true));
    }

    #[test]
    fn test_segregation_max() {
        let seg = Segregation::max([
            Segregation { source: 1, recipient: 4 },
            Segregation { source: 3, recipient: 0 },
        ]);
        assert_eq!(seg, Segregation { source: 3, recipient: 4 });
    }

    #[test]
    fn test_bin_proportions() {
        let inc = Binning::Inclusive;
        assert_eq!(bin_proportions(&[], 1, inc), Vec::<usize>::new());
        assert_eq!(bin_proportions(&[1.0], 0, inc), Vec::<usize>::new());
        assert_eq!(bin_proportions(&[1.0], 1, inc), vec![1]);
        assert_eq!(bin_proportions(&[1.0, 1.0], 2, inc), vec![0, 2]);
        assert_eq!(bin_proportions(&[1.0, 1.0], 1, inc), vec![2]);
        assert_eq!(bin_proportions(&[1.0, 0.1, 1.0], 2, inc), vec![1, 2]);
        assert_eq!(bin_proportions(&[1.0, 0.0, 0.0], 2, inc), vec![2, 1]);
        assert_eq!(
            bin_proportions(&[1.0, 0.4, 0.8, 1.0], 10, inc),
            vec![0, 0, 0, 1, 0, 0, 0, 1, 0, 2]
        );
        assert_eq!(
            bin_proportions(&[0.3, 0.7, 0.6, 0.2, 0.9], 10, inc),
            vec![0, 1, 1, 0, 0, 1, 1, 0, 1, 0]
        );
        assert_eq!(bin_proportions(&[1.0 / 3.0, 2.0 / 3.0, 1.0], 3, inc), vec![1, 1, 1]);
    }

    #[test]
    fn test_bin_proportions_ceiling() {
        let ceil = Binning::Ceiling;
        assert_eq!(bin_proportions(&[1.0, 0.0, 0.0], 2, ceil), vec![0, 1]);
        assert_eq!(bin_proportions(&[0.5, 1.0], 2, ceil), vec![1, 1]);
    }

    #[test]
    fn test_gini_purity() {
        assert_eq!(gini_purity(&[]), 0.0);
        assert_eq!(gini_purity(&[30]), 0.0);
        assert_eq!(gini_purity(&[1, 0, 0]), 0.0);
        assert_eq!(gini_purity(&[0, 0, 0]), 0.0);
        assert_eq!(gini_purity(&[0, 7]), 0.0);
        assert_eq!(gini_purity(&[1, 1]), 1.0);
        assert_eq!(gini_purity(&[1, 1, 1, 1]), 1.0);
        assert!(gini_purity(&[2, 2]) > gini_purity(&[3, 1]));
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy(&[]), 0.0);
        assert_eq!(shannon_entropy(&[1]), 0.0);
        assert_eq!(shannon_entropy(&[57]), 0.0);
        assert_eq!(shannon_entropy(&[0, 1]), 0.0);
        assert_eq!(shannon_entropy(&[0, 99]), 0.0);
        assert!(shannon_entropy(&[1, 1, 1]) > shannon_entropy(&[1, 0, 2]));
        assert!(shannon_entropy(&[0, 0, 1, 3, 3]) > shannon_entropy(&[0, 0, 0, 0, 7]));
        assert_eq!(shannon_entropy(&[1, 1, 0, 0, 0]), shannon_entropy(&[1, 0, 0, 0, 1]));
        assert!(shannon_entropy(&[3, 1, 0, 0]) < shannon_entropy(&[2, 2, 0, 0]));
        assert!((shannon_entropy(&[1, 1, 1]) - 3.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_proxy_limitation() {
        // Both measures agree on the extremes but may rank intermediate spreads differently
        let a = [5, 1, 1, 1, 1, 1];
        let b = [0, 3, 0, 2, 3, 2];
        assert!(gini_purity(&a) < gini_purity(&b));
        assert!(shannon_entropy(&a) > shannon_entropy(&b));
    }

    #[test]
    fn test_check_clumpiness() {
        let c = clumpiness();
        assert_eq!(c.check_clumpiness(&Branch::new()), DiversityPair::default());

        let b = branch(&[(1, 1.0, 1.0)]);
        assert_eq!(c.check_clumpiness(&b), DiversityPair::default());

        let b = branch(&[(1, 1.0, 1.0), (2, 0.5, 1.0)]);
        let pair = c.check_clumpiness(&b);
        assert!(pair.source > pair.recipient);
        assert_eq!(pair.detection(), Detection::new(true, false));

        let disabled = Clumpiness::new(0, Binning::Inclusive, Diversity::GiniPurity);
        assert_eq!(disabled.check_clumpiness(&b), DiversityPair::default());
    }

    #[test]
    fn test_check_clumpiness_composite() {
        let c = clumpiness();
        let output = c.check_clumpiness_composite(&Tree::default());
        assert_eq!(output, CompositeClumpiness::default());
        assert!(output.detection().is_ambiguous());

        let tree = Tree::from_branches(
            branch(&[(1, 0.8, 1.0), (2, 0.5, 1.0)]),
            branch(&[(3, 1.0, 0.0), (4, 0.5, 0.0)]),
            branch(&[(5, 0.0, 1.0), (6, 0.5, 0.8)]),
        );
        let output = c.check_clumpiness_composite(&tree);
        assert!(output.ancestral_to_source.source > output.ancestral_to_source.recipient);
        assert!(output.ancestral_to_recipient.source > output.ancestral_to_recipient.recipient);
        assert_eq!(output.detection(), Detection::new(true, false));

        let tree = Tree::from_branches(
            branch(&[(1, 1.0, 1.0), (2, 0.7, 0.8)]),
            branch(&[(3, 1.0, 0.0)]),
            branch(&[(4, 0.0, 1.0)]),
        );
        let output = c.check_clumpiness_composite(&tree);
        assert_eq!(
            output.ancestral_to_source.source,
            output.ancestral_to_recipient.recipient
        );
        assert!(output.ancestral_to_source.source < output.ancestral_to_source.recipient);
        assert_eq!(output.detection(), Detection::default());

        let tree = Tree::from_branches(
            branch(&[(1, 1.0, 1.0), (2, 0.7, 0.8)]),
            branch(&[(3, 0.3, 0.0), (4, 0.5, 0.0)]),
            branch(&[(5, 0.0, 0.3), (6, 0.0, 0.5)]),
        );
        let output = c.check_clumpiness_composite(&tree);
        assert_eq!(
            output.ancestral_to_source.source,
            output.ancestral_to_recipient.recipient
        );
        assert!(output.ancestral_to_source.source > output.ancestral_to_source.recipient);
        assert!(output.ancestral_to_recipient.source < output.ancestral_to_recipient.recipient);
        assert!(output.detection().is_ambiguous());
    }

    #[test]
    fn test_composite_requires_both_lineages() {
        let pair = |source, recipient| DiversityPair { source, recipient };

        let c = CompositeClumpiness {
            ancestral_to_source: pair(0.8, 0.5),
            ancestral_to_recipient: pair(0.5, 0.5),
        };
        assert_eq!(c.detection(), Detection::new(true, false));

        let c = CompositeClumpiness {
            ancestral_to_source: pair(0.5, 0.5),
            ancestral_to_recipient: pair(0.5, 0.5),
        };
        assert_eq!(c.detection(), Detection::default());

        let c = CompositeClumpiness {
            ancestral_to_source: pair(0.5, 0.5),
            ancestral_to_recipient: pair(0.2, 0.6),
        };
        assert_eq!(c.detection(), Detection::new(false, true));
    }

    #[test]
    fn test_tally_and_magnitude() {
        let pair = |source, recipient| DiversityPair { source, recipient };
        let correct = CompositeClumpiness {
            ancestral_to_source: pair(0.9, 0.3),
            ancestral_to_recipient: pair(0.6, 0.3),
        };
        let reverse = CompositeClumpiness {
            ancestral_to_source: pair(0.3, 0.6),
            ancestral_to_recipient: pair(0.2, 0.4),
        };

        assert_eq!(clumpiness_tally(&[correct, correct, reverse]), Detection::new(true, false));
        assert_eq!(clumpiness_tally(&[correct, reverse]), Detection::default());
        assert_eq!(clumpiness_tally(&[reverse]), Detection::new(false, true));

        assert_eq!(clumpiness_magnitude(&[correct]), Detection::new(true, false));
        assert_eq!(clumpiness_magnitude(&[reverse]), Detection::new(false, true));
        assert_eq!(clumpiness_magnitude(&[]), Detection::default());
    }

    #[test]
    fn test_ratio_zero_guard() {
        let pair = |source, recipient| DiversityPair { source, recipient };
        assert_eq!(pair(0.0, 0.0).ratio(), 100.0);
        assert_eq!(pair(0.5, 0.0).ratio(), 100.5);
        assert_eq!(pair(0.5, 0.25).ratio(), 2.0);
        assert_eq!(pair(0.0, 0.5).ratio(), 0.0);
    }

    #[test]
    fn test_magnitude_of_zero_diversity_lineages() {
        let zero = CompositeClumpiness::default();
        assert_eq!(clumpiness_magnitude(&[zero]), Detection::new(true, false));

        let equal = CompositeClumpiness {
            ancestral_to_source: DiversityPair { source: 0.5, recipient: 0.5 },
            ancestral_to_recipient: DiversityPair { source: 0.5, recipient: 0.5 },
        };
        assert_eq!(clumpiness_magnitude(&[equal]), Detection::new(false, true));
    }
}
