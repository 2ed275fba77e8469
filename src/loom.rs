#[cfg(not(loom))]
pub(crate) mod export {
  pub(crate) mod hint {
    pub(crate) use std::hint::spin_loop;
  }

  pub(crate) mod sync {
    pub(crate) mod atomic {
      pub(crate) use std::sync::atomic::AtomicPtr;
      pub(crate) use std::sync::atomic::AtomicU32;
      pub(crate) use std::sync::atomic::Ordering;
    }
  }
}

#[cfg(loom)]
pub(crate) mod export {
  pub(crate) mod hint {
    pub(crate) use loom::hint::spin_loop;
  }

  pub(crate) mod sync {
    pub(crate) mod atomic {
      pub(crate) use loom::sync::atomic::AtomicPtr;
      pub(crate) use loom::sync::atomic::AtomicU32;
      pub(crate) use loom::sync::atomic::Ordering;
    }
  }
}

#[doc(inline)]
pub(crate) use self::export::*;
