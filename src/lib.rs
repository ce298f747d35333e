#![no_std]

#[cfg(feature="use-serde")]
#[macro_use] extern crate serde_derive;
#[cfg(feature="use-serde")]
extern crate serde;
#[macro_use] extern crate log;
extern crate yaxpeax_arch;

pub mod armv8;
