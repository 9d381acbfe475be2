//! openEMS simulation description: boundaries, excitation, mesh,
//! properties, ports and the runner that hands everything to the solver.

pub mod boundary;
pub mod config;
pub mod constants;
pub mod excitation;
pub mod fdtd;
pub mod grid;
pub mod materials;
pub mod nf2ff;
pub mod port;
pub mod probes;
pub mod runner;
pub mod structure;
