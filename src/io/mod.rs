//! File I/O: simulation decks, solid models and the openEMS description.

pub mod csx;
pub mod deck;
pub mod stl;

pub use csx::{to_openems_xml_string, write_openems_xml};
pub use deck::{read_deck, write_deck};
pub use stl::{StlFormat, read_stl, write_stl};
