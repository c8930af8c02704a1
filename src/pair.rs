//! The pair chain itself: construction, tail discovery, named/indexed lookup, and field mutation.

use std::rc::Rc;

use log::{debug, warn};

use crate::error::ParseError;
use crate::head::HeadView;
use crate::layout::{HeadLayout, IndexedOutcome, NextHead, SuccessorRule};
use crate::primitive::{FieldValue, Scalar};

/// A single pair in the chain: a fixed-layout head over a window of `buffer`, plus enough
/// ancestry to resolve a tail it cannot decide on its own (responsibility handover).
///
/// `buffer` always starts at this pair's own head and extends to the end of whatever region was
/// handed to the chain; it is never truncated to a "known" length, since that length is often
/// exactly what `tail()` is computing. `parent` is an `Rc` rather than a borrow: the chain is
/// walked both downward (building tails) and upward (handover), so pairs share ownership of their
/// ancestors instead of borrowing them.
#[derive(Clone)]
pub struct Pair<'buf> {
    buffer: &'buf [u8],
    layout: Rc<HeadLayout>,
    parent: Option<Rc<Pair<'buf>>>,
    index: usize,
}

impl<'buf> Pair<'buf> {
    /// Builds the root pair of a chain: no parent, position zero.
    pub fn new(buffer: &'buf [u8], layout: Rc<HeadLayout>) -> Result<Self, ParseError> {
        Self::with_parent(buffer, layout, None, 0)
    }

    fn with_parent(
        buffer: &'buf [u8],
        layout: Rc<HeadLayout>,
        parent: Option<Rc<Pair<'buf>>>,
        index: usize,
    ) -> Result<Self, ParseError> {
        if buffer.len() < layout.size {
            warn!(
                "rejecting pair: layout `{}` needs {} head bytes, buffer has {}",
                layout.name,
                layout.size,
                buffer.len()
            );
            return Err(ParseError::HeadOverflow {
                layout: layout.name,
                head_size: layout.size,
                buffer_len: buffer.len(),
            });
        }
        debug!(
            "constructed pair: layout=`{}` buffer_len={} has_parent={} index={}",
            layout.name,
            buffer.len(),
            parent.is_some(),
            index
        );
        Ok(Self {
            buffer,
            layout,
            parent,
            index,
        })
    }

    /// The name of this pair's layout.
    pub fn layout_name(&self) -> &'static str {
        self.layout.name
    }

    /// A read-only, in-place-mutable view over this pair's own head fields.
    pub fn head(&self) -> HeadView<'buf> {
        HeadView::new(self.layout.clone(), &self.buffer[..self.layout.size])
    }

    /// The bytes that make up this pair's head, and nothing past it.
    pub fn head_buffer(&self) -> &'buf [u8] {
        &self.buffer[..self.layout.size]
    }

    /// The entire region handed to this pair, unbounded by any successor resolution.
    pub fn raw_buffer(&self) -> &'buf [u8] {
        self.buffer
    }

    /// This pair's head plus every byte consumed by its tail chain, recursively, ending where
    /// the chain itself ends. Requires walking (and therefore fully resolving) every successor.
    pub fn full_buffer(&self) -> Result<&'buf [u8], ParseError> {
        let len = self.full_len()?;
        Ok(&self.buffer[..len])
    }

    fn full_len(&self) -> Result<usize, ParseError> {
        let mut len = self.layout.size;
        if let Some(tail) = self.tail()? {
            len += tail.full_len()?;
        }
        Ok(len)
    }

    /// Discovers and constructs the pair that follows this one, or `None` if the chain ends here.
    pub fn tail(&self) -> Result<Option<Pair<'buf>>, ParseError> {
        let head = self.head();
        let next = match &self.layout.successor {
            SuccessorRule::Homogeneous(rule) => rule(&head)?,
            SuccessorRule::CdrMap(_) => match self.layout.indexed_rule(&head, 0)? {
                IndexedOutcome::Layout(layout) => NextHead::Layout(layout),
                IndexedOutcome::End | IndexedOutcome::OutOfRange => NextHead::End,
            },
            SuccessorRule::ArrayDelegate => {
                return self.handover(self.index + 1, self.parent.clone());
            }
        };

        match next {
            NextHead::End => Ok(None),
            NextHead::Layout(layout) => {
                let tail_buffer = &self.buffer[self.layout.size..];
                let parent = Rc::new(self.clone());
                Pair::with_parent(tail_buffer, layout, Some(parent), 0).map(Some)
            }
        }
    }

    /// Walks up the ancestor chain starting at `walker`, asking each one's indexed rule whether
    /// position `k` belongs to it. This is the "responsibility handover" used by array elements
    /// that cannot decide their own successor.
    ///
    /// Running out of ancestors without any rule ever accepting or ending the walk is not an
    /// error: it just means there is no tail here, the same as reaching an explicit `End`.
    /// `SuccessorUnresolved` is reserved for a rule that is present but cannot be evaluated.
    fn handover(
        &self,
        mut k: usize,
        mut walker: Option<Rc<Pair<'buf>>>,
    ) -> Result<Option<Pair<'buf>>, ParseError> {
        while let Some(w) = walker {
            let whead = w.head();
            match w.layout.indexed_rule(&whead, k)? {
                IndexedOutcome::Layout(layout) => {
                    let tail_buffer = &self.buffer[self.layout.size..];
                    return Pair::with_parent(tail_buffer, layout, Some(w.clone()), k).map(Some);
                }
                IndexedOutcome::End => return Ok(None),
                IndexedOutcome::OutOfRange => {
                    k = w.index + 1;
                    walker = w.parent.clone();
                }
            }
        }
        Ok(None)
    }

    /// Looks up a field by name: first in this pair's own head, then among CDR-map slots (a named
    /// slot resolves to its first element, regardless of how many elements it holds — indexed
    /// access reaches the rest), then by following the tail chain.
    pub fn lookup(&self, name: &str) -> Result<Lookup<'buf>, ParseError> {
        match self.head().get(name) {
            Ok(value) => return Ok(Lookup::Value(value)),
            Err(ParseError::UnknownField { .. }) => {}
            Err(e) => return Err(e),
        }

        let head = self.head();
        if let Some((base, _entry)) = self.layout.cdr_entry(&head, name)? {
            return Ok(Lookup::Pair(self.nth_in_map(base)?));
        }

        match self.tail()? {
            Some(tail) => tail.lookup(name),
            None => Err(ParseError::UnknownField {
                layout: self.layout.name,
                name: name.to_string(),
            }),
        }
    }

    /// Returns the `i`-th element of the named CDR-map slot, searching this pair's own layout
    /// first and then the tail chain.
    pub fn index(&self, name: &str, i: usize) -> Result<Pair<'buf>, ParseError> {
        let head = self.head();
        if let Some((base, entry)) = self.layout.cdr_entry(&head, name)? {
            let count = entry.count.resolve(&head)?;
            if i >= count {
                return Err(ParseError::OutOfRange {
                    name: name.to_string(),
                    index: i,
                    count,
                });
            }
            return self.nth_in_map(base + i);
        }
        match self.tail()? {
            Some(tail) => tail.index(name, i),
            None => Err(ParseError::UnknownField {
                layout: self.layout.name,
                name: name.to_string(),
            }),
        }
    }

    /// Overwrites a named scalar field in place, searching this pair's own head first and then
    /// the tail chain.
    pub fn set(&self, name: &str, value: Scalar) -> Result<(), ParseError> {
        match self.head().set(name, value) {
            Ok(()) => Ok(()),
            Err(ParseError::UnknownField { .. }) => match self.tail()? {
                Some(tail) => tail.set(name, value),
                None => Err(ParseError::UnknownField {
                    layout: self.layout.name,
                    name: name.to_string(),
                }),
            },
            Err(e) => Err(e),
        }
    }

    /// Reaches the `k`-th flat position of this pair's own CDR map, preferring a direct byte
    /// offset computation over a sequential walk whenever every entry up to `k` holds fixed-size,
    /// terminal elements (no entry's element layout itself delegates further).
    fn nth_in_map(&self, k: usize) -> Result<Pair<'buf>, ParseError> {
        if let Some(pair) = self.fast_path_nth(k)? {
            return Ok(pair);
        }
        let mut current = self.tail()?.ok_or_else(|| ParseError::SuccessorUnresolved {
            layout: self.layout.name,
            reason: "CDR map declared entries but produced no first element".to_string(),
        })?;
        for _ in 0..k {
            current = current.tail()?.ok_or_else(|| ParseError::SuccessorUnresolved {
                layout: self.layout.name,
                reason: "CDR map walk ended before reaching the requested index".to_string(),
            })?;
        }
        Ok(current)
    }

    fn fast_path_nth(&self, k: usize) -> Result<Option<Pair<'buf>>, ParseError> {
        let entries = match &self.layout.successor {
            SuccessorRule::CdrMap(entries) => entries,
            _ => return Ok(None),
        };
        let head = self.head();
        let mut base = 0usize;
        let mut byte_offset = self.layout.size;
        for entry in entries {
            let count = entry.count.resolve(&head)?;
            let fixed_size = matches!(entry.element.successor, SuccessorRule::ArrayDelegate);
            if !fixed_size {
                return Ok(None);
            }
            if k < base + count {
                let within = k - base;
                let elem_offset = byte_offset + within * entry.element.size;
                let elem_buffer = &self.buffer[elem_offset..];
                let parent = Rc::new(self.clone());
                let pair = Pair::with_parent(elem_buffer, entry.element.clone(), Some(parent), k)?;
                return Ok(Some(pair));
            }
            base += count;
            byte_offset += count * entry.element.size;
        }
        Ok(None)
    }
}

/// The result of a named field lookup: either a scalar/byte value, or a sub-pair.
pub enum Lookup<'buf> {
    Value(FieldValue<'buf>),
    Pair(Pair<'buf>),
}
