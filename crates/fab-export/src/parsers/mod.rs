pub mod kicad;
pub mod kicad_sexpr;
pub mod netlist;
