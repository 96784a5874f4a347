/// Maps a sample time in seconds to an amplitude.
pub trait Modifier: Send {
    fn apply(&mut self, t: f64) -> f64;

    fn times<M: Modifier>(self, other: M) -> Product<Self, M>
    where
        Self: Sized,
    {
        Product { a: self, b: other }
    }
}

impl<F> Modifier for F
where
    F: FnMut(f64) -> f64 + Send,
{
    fn apply(&mut self, t: f64) -> f64 {
        self(t)
    }
}

pub type BoxedModifier = Box<dyn FnMut(f64) -> f64 + Send>;

/// Pointwise product of two modifiers, e.g. envelope times timbre.
pub struct Product<A, B> {
    a: A,
    b: B,
}

impl<A: Modifier, B: Modifier> Modifier for Product<A, B> {
    fn apply(&mut self, t: f64) -> f64 {
        self.a.apply(t) * self.b.apply(t)
    }
}

pub struct Modified<I, M> {
    source: I,
    modifier: M,
}

impl<I, M> Iterator for Modified<I, M>
where
    I: Iterator<Item = f64>,
    M: Modifier,
{
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.source.next().map(|t| self.modifier.apply(t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.source.size_hint()
    }
}

pub trait SignalExt: Iterator<Item = f64> + Sized {
    fn modify<M: Modifier>(self, modifier: M) -> Modified<Self, M> {
        Modified {
            source: self,
            modifier,
        }
    }
}

impl<I: Iterator<Item = f64>> SignalExt for I {}
