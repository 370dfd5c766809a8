use std::fmt;
use std::str::FromStr;

/// Alignment orientation
///
/// `F` and `R` are accepted as raw-orientation aliases of `+` and `-`.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" | "F" => Ok(Strand::Forward),
            "-" | "R" => Ok(Strand::Reverse),
            other => Err(format!("unrecognised strand code '{other}'")),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Key for grouping positions by chromosome and strand
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct StrandKey {
    pub chrom_id: u32,
    pub strand: Strand,
}

/// Canonical identity of a genomic position
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct LocusKey {
    pub chrom_id: u32,
    pub strand: Strand,
    pub coordinate: i64,
}

impl LocusKey {
    pub fn new(chrom_id: u32, strand: Strand, coordinate: i64) -> Self {
        LocusKey {
            chrom_id,
            strand,
            coordinate,
        }
    }

    /// Locus of an alignment: its start on the forward strand, its stop on the reverse
    pub fn of_alignment(chrom_id: u32, strand: Strand, start: i64, stop: i64) -> Self {
        let coordinate = match strand {
            Strand::Forward => start,
            Strand::Reverse => stop,
        };
        LocusKey::new(chrom_id, strand, coordinate)
    }

    pub fn strand_key(&self) -> StrandKey {
        StrandKey {
            chrom_id: self.chrom_id,
            strand: self.strand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_aliases() {
        assert_eq!("+".parse::<Strand>(), Ok(Strand::Forward));
        assert_eq!("F".parse::<Strand>(), Ok(Strand::Forward));
        assert_eq!("-".parse::<Strand>(), Ok(Strand::Reverse));
        assert_eq!("R".parse::<Strand>(), Ok(Strand::Reverse));
        assert!("x".parse::<Strand>().is_err());
        assert!("".parse::<Strand>().is_err());
        assert_eq!(Strand::Reverse.to_string(), "-");
    }

    #[test]
    fn test_locus_coordinate_follows_strand() {
        let fwd = LocusKey::of_alignment(0, Strand::Forward, 100, 135);
        let rev = LocusKey::of_alignment(0, Strand::Reverse, 100, 135);
        assert_eq!(fwd.coordinate, 100);
        assert_eq!(rev.coordinate, 135);
        assert_ne!(fwd, rev);
        assert_eq!(fwd, LocusKey::new(0, Strand::Forward, 100));
    }
}
