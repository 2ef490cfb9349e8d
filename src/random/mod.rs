//! Named, independently seeded random number streams.
//!
//! Every stream is identified by a zero-sized type declared with
//! [`crate::define_rng!`]. All streams derive their seed from a single base seed set
//! with [`ContextRandomExt::init_random`], so a run is reproducible from that
//! seed while the streams stay independent of each other: drawing more
//! numbers for network generation does not shift the numbers the dynamics
//! sees.
mod context_ext;
mod macros;

use std::any::{Any, TypeId};
use std::cell::RefCell;

pub use context_ext::ContextRandomExt;

use crate::define_data_plugin;
use crate::rand::SeedableRng;
use crate::HashMap;

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

// This is a wrapper that allows for future support for different types of
// random number generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

struct RngData {
    base_seed: u64,
    rng_holders: RefCell<HashMap<TypeId, RngHolder>>,
}

// Registers a data container which stores:
// * base_seed: A base seed for all rngs
// * rng_holders: A map of rngs, keyed by their RngId. Note that this is
//   stored in a RefCell to allow for mutable borrow without requiring a
//   mutable borrow of the Context itself.
define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: 0,
        rng_holders: RefCell::new(HashMap::default()),
    }
);
