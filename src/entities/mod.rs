pub mod prelude;

pub mod geocache;
