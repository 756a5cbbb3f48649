use rand::Rng;

/// Distributions defined by a domain of [0.0, 1.0]. A lot like general random
/// distributions, but you can plot the contents on a graph.
pub trait PlottedDistribution {
    type Item;

    /// Sample the distribution using a value between 0 and 1.
    ///
    /// This maps to the whole probability space of the distribution.
    fn plot(&self, x: f32) -> Self::Item;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Item {
        self.plot(rng.gen::<f32>())
    }
}

/// Weighted choice among a fixed set of values.
///
/// Each value is picked with probability proportional to its weight. Values
/// with zero weight are never picked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Weighted<T> {
    /// Values with their cumulative weight upper bounds.
    items: Vec<(T, u32)>,
    total: u32,
}

impl<T> Weighted<T> {
    /// Build a selector, returns `None` if there is nothing with a nonzero
    /// weight to choose from.
    pub fn new(items: impl IntoIterator<Item = (T, u32)>) -> Option<Self> {
        let mut total = 0;
        let items: Vec<(T, u32)> = items
            .into_iter()
            .filter(|(_, w)| *w > 0)
            .map(|(a, w)| {
                total += w;
                (a, total)
            })
            .collect();

        if items.is_empty() {
            None
        } else {
            Some(Weighted { items, total })
        }
    }

    pub fn total_weight(&self) -> u32 {
        self.total
    }
}

impl<T: Clone> PlottedDistribution for Weighted<T> {
    type Item = T;

    fn plot(&self, x: f32) -> T {
        let pos = (x.clamp(0.0, 1.0) * self.total as f32) as u32;
        // Floating point fuzz at x = 1.0 can land pos on total, fall back to
        // the last item then.
        let idx = self
            .items
            .iter()
            .position(|(_, bound)| pos < *bound)
            .unwrap_or(self.items.len() - 1);
        self.items[idx].0.clone()
    }
}
