mod trace_table;

pub use trace_table::TraceTableScreen;
