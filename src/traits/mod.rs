mod connection;
mod cursor;
mod driver;

pub use connection::NativeConnection;
pub use cursor::NativeCursor;
pub use driver::NativeDriver;
