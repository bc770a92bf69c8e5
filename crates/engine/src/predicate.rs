use std::fmt;
use std::rc::Rc;

/// Row filter shared by every read and rewrite operation.
///
/// Receives the full row in schema order. [`Predicate::all`] matches every
/// row and is what operations use when the caller has no filter.
#[derive(Clone, Default)]
pub struct Predicate<'a> {
    filter: Option<Rc<dyn Fn(&[String]) -> bool + 'a>>,
}

impl<'a> Predicate<'a> {
    /// Matches every row.
    pub fn all() -> Self {
        Self { filter: None }
    }

    pub fn new<F>(filter: F) -> Self
    where
        F: Fn(&[String]) -> bool + 'a,
    {
        Self {
            filter: Some(Rc::new(filter)),
        }
    }

    /// Matches rows whose field at `idx` equals `value`.
    pub fn column_eq(idx: usize, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(move |row| row.get(idx).is_some_and(|f| *f == value))
    }

    pub fn matches(&self, row: &[String]) -> bool {
        match &self.filter {
            Some(f) => f(row),
            None => true,
        }
    }

    /// `true` for the match-everything predicate.
    pub fn is_all(&self) -> bool {
        self.filter.is_none()
    }
}

impl fmt::Debug for Predicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_all() {
            "Predicate(all)"
        } else {
            "Predicate(fn)"
        })
    }
}
