//! Small helpers shared by the reader and the writer.

pub mod qname;
