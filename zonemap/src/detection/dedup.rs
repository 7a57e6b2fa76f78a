use crate::config::DedupConfig;
use crate::detection::Candidate;
use crate::palette::ZoneKind;

/// What happened to an offered candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Appended; `replaced` accepted candidates were removed in its favour.
    Accepted { replaced: usize },
    TooSmall,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Distinct,
    /// The existing candidate stays, the new one is dropped.
    Kept,
    /// The new candidate supersedes the existing one.
    Superseded,
}

/// Maintains the accepted set while candidates stream in.
///
/// No two accepted same-label candidates ever have centres closer than
/// `same_block_distance_factor` times their mean side length.
#[derive(Debug, Clone)]
pub struct DedupResolver {
    config: DedupConfig,
    accepted: Vec<Candidate>,
}

impl DedupResolver {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            accepted: Vec::new(),
        }
    }

    pub fn accepted(&self) -> &[Candidate] {
        &self.accepted
    }

    pub fn into_accepted(self) -> Vec<Candidate> {
        self.accepted
    }

    pub fn take_accepted(&mut self) -> Vec<Candidate> {
        std::mem::take(&mut self.accepted)
    }

    pub fn clear(&mut self) {
        self.accepted.clear();
    }

    pub fn is_large_enough(&self, candidate: &Candidate) -> bool {
        let (min_side, min_area) = match candidate.kind {
            ZoneKind::Area => (self.config.min_area_side, self.config.min_area_area),
            ZoneKind::Overlay => (self.config.min_overlay_side, self.config.min_overlay_area),
        };
        let rect = candidate.scan_rect;
        rect.width >= min_side && rect.height >= min_side && rect.area() >= min_area
    }

    pub fn offer(&mut self, candidate: Candidate) -> Resolution {
        if !self.is_large_enough(&candidate) {
            return Resolution::TooSmall;
        }

        let mut superseded = Vec::new();
        for (i, existing) in self.accepted.iter().enumerate() {
            match self.compare(&candidate, existing) {
                Verdict::Distinct => {}
                Verdict::Kept => return Resolution::Duplicate,
                Verdict::Superseded => superseded.push(i),
            }
        }

        let replaced = superseded.len();
        for i in superseded.into_iter().rev() {
            let removed = self.accepted.remove(i);
            tracing::trace!(
                "{} {} superseded by {}",
                removed.label,
                removed.scan_rect,
                candidate.scan_rect
            );
        }
        self.accepted.push(candidate);

        Resolution::Accepted { replaced }
    }

    fn compare(&self, new: &Candidate, existing: &Candidate) -> Verdict {
        let a = new.scan_rect;
        let b = existing.scan_rect;
        let overlap = a.overlap_area(&b) as f64;
        let exceeds = |fraction: f32| {
            let fraction = fraction as f64;
            overlap > fraction * a.area() as f64 || overlap > fraction * b.area() as f64
        };

        if new.label != existing.label {
            return if exceeds(self.config.cross_label_overlap) {
                Verdict::Kept
            } else {
                Verdict::Distinct
            };
        }

        let (ax, ay) = a.center();
        let (bx, by) = b.center();
        let distance = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
        let mean_side = (a.width + a.height + b.width + b.height) as f32 / 4.0;

        let same_block = distance < self.config.same_block_distance_factor * mean_side
            || exceeds(self.config.same_label_overlap);
        if !same_block {
            return Verdict::Distinct;
        }

        if a.area() as f64 > self.config.replace_area_ratio as f64 * b.area() as f64 {
            Verdict::Superseded
        } else {
            Verdict::Kept
        }
    }
}
