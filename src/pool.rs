use rand::Rng;
use std::num::NonZeroUsize;

pub const DEFAULT_MAX_CONTRIBUTORS: usize = 30;
pub const DEFAULT_MAX_REPOSITORIES: usize = 10;

/// Outcome of asking a pool for a member.
#[derive(Debug, Clone, PartialEq)]
pub enum Draw<T> {
    Created(T),
    Reused(T),
}

impl<T> Draw<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Draw::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Draw::Created(t) | Draw::Reused(t) => t,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Draw::Created(t) | Draw::Reused(t) => t,
        }
    }
}

/// Grows `members` with `create` until it holds `cap` entries, then hands
/// out uniformly chosen existing entries. Never shrinks.
pub fn draw<T, R, F>(members: &mut Vec<T>, cap: NonZeroUsize, rng: &mut R, create: F) -> Draw<T>
where
    T: Clone,
    R: Rng + ?Sized,
    F: FnOnce(&mut R) -> T,
{
    if members.len() < cap.get() {
        let member = create(rng);
        members.push(member.clone());
        return Draw::Created(member);
    }
    // cap >= 1, so an at-cap pool always has a member at 0..len
    let index = rng.gen_range(0..members.len());
    Draw::Reused(members[index].clone())
}

/// Capacity caps for the reusable pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCaps {
    pub contributors: NonZeroUsize,
    pub repositories: NonZeroUsize,
}

impl Default for PoolCaps {
    fn default() -> Self {
        PoolCaps {
            contributors: NonZeroUsize::new(DEFAULT_MAX_CONTRIBUTORS).unwrap_or(NonZeroUsize::MIN),
            repositories: NonZeroUsize::new(DEFAULT_MAX_REPOSITORIES).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
