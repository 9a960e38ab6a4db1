use crate::caps::{BufInfo, CapsQuery, CapsValue, Configure};
use crate::Result;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum StreamKind {
    Replay,
    Record,
}

/// Operations the audio framework invokes on a registered device.
pub trait AudioOps: Send + Sync + 'static {
    fn get_caps(&self, query: CapsQuery) -> Result<CapsValue>;

    fn configure(&self, request: Configure) -> Result<()>;

    fn init(&self) -> Result<()>;

    fn start(&self, stream: StreamKind) -> Result<()>;

    fn stop(&self, stream: StreamKind) -> Result<()>;

    /// Hands `buf` to the device, returning how many bytes it accepted.
    fn transmit(&self, buf: &[u8]) -> Result<usize>;

    fn buffer_info(&self) -> BufInfo<'_>;
}
