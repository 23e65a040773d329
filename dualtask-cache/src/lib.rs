//! Interning for stimulus words.
//!
//! Every word the N-back task shows goes through [`intern_word`], so history
//! comparisons are pointer-cheap and the renderer can key its raster cache on
//! the same [`Atom`].

use lazy_static::lazy_static;
use std::sync::RwLock;
pub use string_cache::DefaultAtom as Atom;

lazy_static! {
    static ref WORD_TABLE: RwLock<Vec<Atom>> = RwLock::new(Vec::new());
}

/// Intern a word, registering it in the word table on first sight.
/// Surrounding whitespace is not part of the word.
pub fn intern_word(s: &str) -> Atom {
    let atom = Atom::from(s.trim());
    let mut table = WORD_TABLE.write().unwrap_or_else(|e| e.into_inner());
    if !table.contains(&atom) {
        table.push(atom.clone());
    }
    atom
}

/// Snapshot of every interned word, used to pre-rasterise text.
pub fn interned_words() -> Vec<Atom> {
    WORD_TABLE.read().unwrap_or_else(|e| e.into_inner()).clone()
}
