//! Head layouts: the fixed-offset field tables and successor rules that tell a [`crate::pair::Pair`]
//! how to project its own head and how to find what follows it.

use std::rc::Rc;

use crate::error::ParseError;
use crate::head::HeadView;
use crate::primitive::PrimitiveKind;

/// One named, fixed-offset field within a head.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: PrimitiveKind,
    pub offset: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: PrimitiveKind, offset: usize) -> Self {
        Self { name, kind, offset }
    }
}

/// What follows a head, as decided by a homogeneous successor rule.
#[derive(Clone)]
pub enum NextHead {
    /// The chain continues with another pair of the given layout.
    Layout(Rc<HeadLayout>),
    /// The chain ends here; there is no tail.
    End,
}

/// A homogeneous successor rule: a function of the just-read head values to the next layout.
///
/// Type-erased because each layout's rule closes over its own table of follow-up layouts. `Rc`
/// rather than `Box` so a layout built once can be cloned into every pair that uses it.
pub type HomogeneousFn = Rc<dyn Fn(&HeadView) -> Result<NextHead, ParseError>>;

/// How many elements a CDR-map slot holds.
#[derive(Clone)]
pub enum CdrCount {
    /// Known at layout-definition time.
    Fixed(usize),
    /// Read out of a head field of the pair that owns this slot.
    FromField(&'static str),
}

impl CdrCount {
    /// Resolves the count against the head that declares this CDR-map slot.
    pub fn resolve(&self, head: &HeadView) -> Result<usize, ParseError> {
        match self {
            CdrCount::Fixed(n) => Ok(*n),
            CdrCount::FromField(field) => {
                let value = head.get(field)?;
                let as_u64 = value.as_u64().ok_or_else(|| ParseError::SuccessorUnresolved {
                    layout: head.layout_name(),
                    reason: format!("count field `{field}` is not a scalar"),
                })?;
                Ok(as_u64 as usize)
            }
        }
    }
}

/// One named slot in a CDR map: a run of `count` pairs of a given element layout.
#[derive(Clone)]
pub struct CdrEntry {
    pub name: &'static str,
    pub element: Rc<HeadLayout>,
    pub count: CdrCount,
}

/// How the layout after a head is determined.
#[derive(Clone)]
pub enum SuccessorRule {
    /// The next pair's layout is a function of this head's own values.
    Homogeneous(HomogeneousFn),
    /// An ordered list of named, fixed-count sub-chains, each of a single element layout.
    CdrMap(Vec<CdrEntry>),
    /// This layout never decides its own successor; it defers to whichever ancestor's indexed
    /// rule accepts the walking index (responsibility handover).
    ArrayDelegate,
}

/// The outcome of evaluating an ancestor's indexed rule during responsibility handover.
pub enum IndexedOutcome {
    /// Position `k` belongs to the named CDR slot; continue the chain with this layout.
    Layout(Rc<HeadLayout>),
    /// Position `k` is the terminal position of this rule; the chain ends.
    End,
    /// Position `k` does not belong to this ancestor's rule; keep walking up.
    OutOfRange,
}

/// A fixed-layout head: a byte size, a field table, and a successor rule.
pub struct HeadLayout {
    pub name: &'static str,
    pub size: usize,
    pub fields: Vec<FieldSpec>,
    pub successor: SuccessorRule,
}

impl HeadLayout {
    pub fn new(
        name: &'static str,
        size: usize,
        fields: Vec<FieldSpec>,
        successor: SuccessorRule,
    ) -> Rc<Self> {
        Rc::new(Self {
            name,
            size,
            fields,
            successor,
        })
    }

    /// Looks up a field by name within this layout's own head (not the tail chain).
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Evaluates this layout's successor rule as an *indexed* rule, for position `k` in a
    /// responsibility handover walk. Only `CdrMap` rules can ever accept a position; a
    /// `Homogeneous` or `ArrayDelegate` ancestor is always `OutOfRange` and the walk continues
    /// further up.
    pub fn indexed_rule(&self, head: &HeadView, k: usize) -> Result<IndexedOutcome, ParseError> {
        let entries = match &self.successor {
            SuccessorRule::CdrMap(entries) => entries,
            SuccessorRule::Homogeneous(_) | SuccessorRule::ArrayDelegate => {
                return Ok(IndexedOutcome::OutOfRange)
            }
        };

        let mut base = 0usize;
        for entry in entries {
            let count = entry.count.resolve(head)?;
            if k < base + count {
                return Ok(IndexedOutcome::Layout(entry.element.clone()));
            }
            base += count;
        }
        if k == base {
            return Ok(IndexedOutcome::End);
        }
        Ok(IndexedOutcome::OutOfRange)
    }

    /// Locates the CDR-map entry named `name` along with the flat base index it starts at, by
    /// resolving every entry's count against `head`. Used for named indexed lookup.
    pub fn cdr_entry(
        &self,
        head: &HeadView,
        name: &str,
    ) -> Result<Option<(usize, &CdrEntry)>, ParseError> {
        let entries = match &self.successor {
            SuccessorRule::CdrMap(entries) => entries,
            _ => return Ok(None),
        };
        let mut base = 0usize;
        for entry in entries {
            if entry.name == name {
                return Ok(Some((base, entry)));
            }
            base += entry.count.resolve(head)?;
        }
        Ok(None)
    }
}
