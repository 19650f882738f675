use crate::Vec;

/// The evaluation stack of a [`Simulation`](super::Simulation).
///
/// Holds the ids of runtime nodes that are still being evaluated, the most
/// recently pushed one on top. The maximum size is a hard limit: callers
/// check [`is_full`](Stack::is_full) before pushing and report the overflow
/// themselves, so `push` only asserts it in debug builds.
///
/// # Examples
///
/// ```ignore
/// use cppsim_core::evaluator::Stack;
///
/// let mut stack = Stack::new(100);
/// stack.push(42);
/// stack.push(17);
/// assert_eq!(stack.pop(), Some(17));
/// assert_eq!(stack.peek(), Some(&42));
/// assert_eq!(stack.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Stack<T> {
    items: Vec<T>,
    max_size: usize,
}

impl<T> Stack<T> {
    /// Creates an empty stack holding at most `max_size` items.
    ///
    /// Space for up to 256 items is allocated up front.
    pub fn new(max_size: usize) -> Self {
        let initial_capacity = max_size.min(256);

        Self {
            items: Vec::with_capacity(initial_capacity),
            max_size,
        }
    }

    /// Pushes a value onto the stack.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the stack is already full.
    #[inline]
    pub fn push(&mut self, value: T) {
        debug_assert!(
            self.items.len() < self.max_size,
            "Stack overflow: attempted to push beyond maximum size of {}",
            self.max_size
        );
        self.items.push(value);
    }

    /// Removes and returns the top value, or `None` if the stack is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Returns a reference to the top value without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether another push would exceed the maximum size.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_size
    }

    /// Maximum number of items the stack may hold.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterates from the bottom of the stack to the top.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Returns the value `depth` positions below the top (0 is the top).
    #[inline]
    pub fn peek_at(&self, depth: usize) -> Option<&T> {
        let len = self.items.len();
        if depth < len {
            self.items.get(len - 1 - depth)
        } else {
            None
        }
    }
}
