/// Pair of resources swapped every frame: one holds the current frame, the
/// other the previous one.
#[derive(Debug)]
pub struct DoubleBuffered<T> {
    a: T,
    b: T,
}

impl<T> DoubleBuffered<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn from_fn(mut f: impl FnMut(&'static str) -> T) -> Self {
        Self {
            a: f("a"),
            b: f("b"),
        }
    }

    /// Returns the resource that's current when the frame parity is
    /// `alternate`.
    pub fn get(&self, alternate: bool) -> &T {
        if alternate {
            &self.b
        } else {
            &self.a
        }
    }

    pub fn get_mut(&mut self, alternate: bool) -> &mut T {
        if alternate {
            &mut self.b
        } else {
            &mut self.a
        }
    }

    /// Returns the resource that's the previous one when the frame parity is
    /// `alternate`.
    pub fn past(&self, alternate: bool) -> &T {
        self.get(!alternate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.a, &self.b].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        [&mut self.a, &mut self.b].into_iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> DoubleBuffered<U> {
        DoubleBuffered {
            a: f(&self.a),
            b: f(&self.b),
        }
    }

    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(&T) -> Result<U, E>,
    ) -> Result<DoubleBuffered<U>, E> {
        Ok(DoubleBuffered {
            a: f(&self.a)?,
            b: f(&self.b)?,
        })
    }

    /// Returns both resources ordered by parity: `[a, b]`.
    pub fn to_array(&self) -> [&T; 2] {
        [&self.a, &self.b]
    }
}
