//! Stream tee: copy a source to a destination while keeping everything copied
//!
//! This is how output is visible to a human watching the destination as it is
//! produced and still available to the calling code once the source closes.

use std::io::{self, ErrorKind, Read, Write};
use tracing::trace;

/// Maximum bytes requested per read.
pub const CHUNK_SIZE: usize = 4096;

/// A readable stream that can wait for readiness.
///
/// Blocking sources already park inside `read`, so their wait is a no-op.
/// Non-blocking sources return `WouldBlock` from `read` and must park in
/// [`wait_readable`](Self::wait_readable) until data or end-of-stream arrives.
pub trait TeeSource: Read {
    /// Block until the next `read` can make progress.
    fn wait_readable(&mut self) -> io::Result<()>;
}

#[cfg(unix)]
fn poll_readable(fd: std::os::fd::BorrowedFd<'_>) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    loop {
        match poll(&mut fds, PollTimeout::NONE) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(io::Error::from(errno)),
        }
    }
}

macro_rules! fd_source {
    ($ty:ty) => {
        impl TeeSource for $ty {
            #[cfg(unix)]
            fn wait_readable(&mut self) -> io::Result<()> {
                use std::os::fd::AsFd;
                poll_readable(self.as_fd())
            }

            #[cfg(not(unix))]
            fn wait_readable(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
    };
}

fd_source!(std::process::ChildStdout);
fd_source!(std::io::PipeReader);

impl TeeSource for &[u8] {
    fn wait_readable(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: TeeSource + ?Sized> TeeSource for Box<T> {
    fn wait_readable(&mut self) -> io::Result<()> {
        (**self).wait_readable()
    }
}

/// Copy `source` into `dest` until end-of-stream, returning every byte copied.
///
/// Each chunk is appended to the accumulator, written to `dest` and flushed
/// before the next read, so the destination sees output live. A `WouldBlock`
/// read parks in [`TeeSource::wait_readable`] instead of spinning; `Interrupted`
/// is retried. End-of-stream is normal completion. The returned bytes equal,
/// in order, everything written to `dest`.
///
/// ```rust
/// use safexec_runner::tee;
///
/// let mut source: &[u8] = b"live and captured";
/// let mut dest = Vec::new();
/// let captured = tee(&mut source, &mut dest).unwrap();
///
/// assert_eq!(captured, b"live and captured");
/// assert_eq!(dest, captured);
/// ```
pub fn tee<R, W>(source: &mut R, dest: &mut W) -> io::Result<Vec<u8>>
where
    R: TeeSource + ?Sized,
    W: Write + ?Sized,
{
    let mut captured = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let data = &chunk[..n];
                captured.extend_from_slice(data);
                dest.write_all(data)?;
                dest.flush()?;
                trace!(bytes = n, total = captured.len(), "tee chunk");
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => source.wait_readable()?,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }

    Ok(captured)
}
