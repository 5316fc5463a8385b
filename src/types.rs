//! Type codes and type registries.
//!
//! Node and edge types are 32-bit codes: a 30-bit base type plus two flag
//! bits. A [`TypeRegistry`] maps names to codes and back; a [`Recoder`]
//! renumbers the base types by descending focus frequency, which fixes the
//! node-type precedence used by the canonical forms.

use indexmap::IndexMap;

use crate::error::ParseError;

/// Mask of the 30-bit base type.
pub const BASE_MASK: u32 = 0x3fff_ffff;
/// Flag bit marking chain (pseudo) types.
pub const SPECIAL: u32 = 1 << 30;
/// Flag bit marking wildcard types, which match any base type.
pub const WILDCARD: u32 = 1 << 31;

/// Flag bit marking an edge type as lying on a marked ring.
///
/// Lives in the edge-type space only; ring and non-ring edges of the same
/// base type deliberately do not match each other once rings are marked.
pub const EDGE_RING: u32 = 1 << 30;

/// The base part of a type code.
#[inline]
pub fn base(typ: u32) -> u32 {
    typ & BASE_MASK
}

/// Whether the code carries the wildcard flag.
#[inline]
pub fn is_wildcard(typ: u32) -> bool {
    typ & WILDCARD != 0
}

/// Whether the code carries the special (chain) flag.
#[inline]
pub fn is_special(typ: u32) -> bool {
    typ & SPECIAL != 0
}

/// Whether a pattern node type matches a host node type.
///
/// A wildcard on either side matches any base type; otherwise the full codes
/// (base plus flags other than the wildcard bit) must agree.
#[inline]
pub fn node_matches(pattern: u32, host: u32) -> bool {
    if is_wildcard(pattern) || is_wildcard(host) {
        return true;
    }
    pattern == host
}

/// Whether a pattern edge type matches a host edge type. Exact match;
/// the ring flag is part of the type.
#[inline]
pub fn edge_matches(pattern: u32, host: u32) -> bool {
    pattern == host
}

/// An insertion-ordered map between type names and type codes.
///
/// Codes are handed out densely from zero in insertion order. A *fixed*
/// registry rejects unknown names instead of extending itself.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    names: IndexMap<String, u32>,
    fixed: bool,
}

impl TypeRegistry {
    /// Create an empty, extendable registry.
    pub fn new() -> Self {
        TypeRegistry {
            names: IndexMap::new(),
            fixed: false,
        }
    }

    /// Create a registry preloaded with `names`, in order, and fix it.
    pub fn fixed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reg = TypeRegistry::new();
        for name in names {
            let next = reg.names.len() as u32;
            reg.names.entry(name.into()).or_insert(next);
        }
        reg.fixed = true;
        reg
    }

    /// Whether the registry rejects unknown names.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Look up `name`, adding it if the registry is extendable.
    ///
    /// `record` is the input record number used in error reports.
    pub fn add(&mut self, name: &str, record: usize) -> Result<u32, ParseError> {
        if let Some(&code) = self.names.get(name) {
            return Ok(code);
        }
        if self.fixed {
            return Err(ParseError::UnknownType {
                record,
                name: name.to_string(),
            });
        }
        let code = self.names.len() as u32;
        self.names.insert(name.to_string(), code);
        Ok(code)
    }

    /// The code of `name`, if known.
    pub fn code(&self, name: &str) -> Option<u32> {
        self.names.get(name).copied()
    }

    /// The name of the base part of `code`, if known.
    pub fn name(&self, code: u32) -> Option<&str> {
        self.names
            .get_index(base(code) as usize)
            .map(|(name, _)| name.as_str())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A renumbering of base node types by descending focus frequency.
///
/// Frequent types receive small codes; the canonical forms therefore prefer
/// frequent types as roots, which keeps the search tree shallow where it is
/// widest. Types whose focus frequency stays below the minimum support can
/// never occur in a reported fragment and are pushed behind all others.
#[derive(Clone, Debug)]
pub struct Recoder {
    /// old base code -> new base code
    map: Vec<u32>,
    /// new base code -> old base code
    inv: Vec<u32>,
    /// focus graph count per new code
    count: Vec<usize>,
    /// types excluded from fragments entirely (by old code)
    excluded: Vec<bool>,
    /// types excluded as seeds only (by old code)
    seed_excluded: Vec<bool>,
}

impl Recoder {
    /// Build a recoder from per-old-type focus graph counts.
    ///
    /// `excluded` types never occur in any fragment; `seed_excluded` types
    /// may occur but do not start a search.
    pub fn new(counts: &[usize], excluded: &[u32], seed_excluded: &[u32]) -> Self {
        let n = counts.len();
        let mut order: Vec<u32> = (0..n as u32).collect();
        // stable by old code on ties, descending by focus count
        order.sort_by(|&a, &b| counts[b as usize].cmp(&counts[a as usize]).then(a.cmp(&b)));

        let mut map = vec![0u32; n];
        let mut count = vec![0usize; n];
        for (new, &old) in order.iter().enumerate() {
            map[old as usize] = new as u32;
            count[new] = counts[old as usize];
        }
        let mut excl = vec![false; n];
        for &t in excluded {
            if (t as usize) < n {
                excl[t as usize] = true;
            }
        }
        let mut seed_excl = vec![false; n];
        for &t in seed_excluded {
            if (t as usize) < n {
                seed_excl[t as usize] = true;
            }
        }
        Recoder {
            map,
            inv: order,
            count,
            excluded: excl,
            seed_excluded: seed_excl,
        }
    }

    /// Number of known base types.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the recoder is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Map an old type code to its new code, preserving flag bits.
    #[inline]
    pub fn encode(&self, typ: u32) -> u32 {
        self.map[base(typ) as usize] | (typ & !BASE_MASK)
    }

    /// Map a new type code back to the old code, preserving flag bits.
    #[inline]
    pub fn decode(&self, typ: u32) -> u32 {
        self.inv[base(typ) as usize] | (typ & !BASE_MASK)
    }

    /// Focus graph count of a new code.
    #[inline]
    pub fn count(&self, new_typ: u32) -> usize {
        self.count[base(new_typ) as usize]
    }

    /// Whether the (old) type is excluded from fragments.
    #[inline]
    pub fn is_excluded(&self, old_typ: u32) -> bool {
        self.excluded[base(old_typ) as usize]
    }

    /// Seed types in recoded order: new codes whose focus count reaches
    /// `s_min` and which are neither excluded nor seed-excluded.
    pub fn seeds(&self, s_min: usize) -> impl Iterator<Item = u32> + '_ {
        (0..self.inv.len() as u32).filter(move |&new| {
            let old = self.inv[new as usize] as usize;
            self.count[new as usize] >= s_min && !self.excluded[old] && !self.seed_excluded[old]
        })
    }
}
