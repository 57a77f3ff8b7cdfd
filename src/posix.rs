//! Thin safe wrappers over the raw syscalls the shell needs.
//!
//! Pipe ends are returned as `File` so ownership and closing follow the
//! usual RAII rules; everything else traffics in raw fds because the
//! callers juggle descriptors across `fork`.

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::mem;
use std::os::unix::io::FromRawFd;
use std::path::Path;
use std::ptr;

fn check_err<T: Ord + Default>(num: T) -> io::Result<T> {
    if num < T::default() {
        return Err(io::Error::last_os_error());
    }
    Ok(num)
}

/// Create an anonymous pipe, returning `(read_end, write_end)`.
pub fn pipe() -> io::Result<(File, File)> {
    let mut fds = [0 as libc::c_int; 2];
    check_err(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    Ok(unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) })
}

/// Fork the process.  Returns `Some(child_pid)` in the parent and `None` in
/// the child.
pub fn fork() -> io::Result<Option<u32>> {
    let pid = check_err(unsafe { libc::fork() })?;
    Ok((pid != 0).then_some(pid as u32))
}

/// Duplicate `oldfd` onto `newfd`, closing `newfd` first if it was open.
pub fn dup2(oldfd: i32, newfd: i32) -> io::Result<()> {
    check_err(unsafe { libc::dup2(oldfd, newfd) })?;
    Ok(())
}

/// Close a raw descriptor not owned by a `File`.
pub fn close(fd: i32) -> io::Result<()> {
    check_err(unsafe { libc::close(fd) })?;
    Ok(())
}

/// Terminate the calling process immediately, without running destructors
/// or flushing standard streams.
pub fn _exit(status: u8) -> ! {
    unsafe { libc::_exit(status as libc::c_int) }
}

/// Exit status decoded from the raw `waitpid` status word.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ExitStatus {
    /// The process exited voluntarily with the given code.
    Exited(u32),
    /// The process was killed by the given signal.
    Signaled(i32),
    /// `waitpid` reported something else (stopped, continued, ...).
    Other(i32),
}

/// Wait for the child with the given pid.
pub fn waitpid(pid: u32) -> io::Result<ExitStatus> {
    let mut status = 0 as libc::c_int;
    check_err(unsafe { libc::waitpid(pid as libc::pid_t, &mut status, 0) })?;
    Ok(decode_exit_status(status))
}

fn decode_exit_status(status: i32) -> ExitStatus {
    if libc::WIFEXITED(status) {
        ExitStatus::Exited(libc::WEXITSTATUS(status) as u32)
    } else if libc::WIFSIGNALED(status) {
        ExitStatus::Signaled(libc::WTERMSIG(status))
    } else {
        ExitStatus::Other(status)
    }
}

/// Restore the default `SIGPIPE` disposition and an empty signal mask.
///
/// Called in the child between `fork` and `exec`: libstd ignores `SIGPIPE`,
/// and children inherit that disposition, but ordinary Unix programs expect
/// the default.
pub fn reset_sigpipe() -> io::Result<()> {
    unsafe {
        let mut set = mem::MaybeUninit::<libc::sigset_t>::uninit();
        check_err(libc::sigemptyset(set.as_mut_ptr()))?;
        check_err(libc::pthread_sigmask(
            libc::SIG_SETMASK,
            set.as_ptr(),
            ptr::null_mut(),
        ))?;
        if libc::signal(libc::SIGPIPE, libc::SIG_DFL) == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn to_cstring(bytes: &[u8]) -> io::Result<CString> {
    if bytes.contains(&0) {
        return Err(io::Error::from_raw_os_error(libc::EINVAL));
    }
    // cannot fail once embedded NULs are ruled out
    Ok(CString::new(bytes).expect("converting argument to C string"))
}

/// An exec call whose C strings were marshalled ahead of the fork, so the
/// child only assembles pointers before calling `execv`.
pub struct PreparedExec {
    prog: CString,
    argv: Vec<CString>,
}

impl PreparedExec {
    /// Marshal `prog` and `argv` for a later [`exec`](Self::exec).
    pub fn new(prog: &Path, argv: &[String]) -> io::Result<PreparedExec> {
        use std::os::unix::ffi::OsStrExt;
        let prog = to_cstring(prog.as_os_str().as_bytes())?;
        let argv = argv
            .iter()
            .map(|a| to_cstring(a.as_bytes()))
            .collect::<io::Result<Vec<_>>>()?;
        Ok(PreparedExec { prog, argv })
    }

    /// Replace the current process image.  Only returns on failure.
    pub fn exec(&self) -> io::Error {
        let mut argv_ptr: Vec<*const libc::c_char> =
            self.argv.iter().map(|a| a.as_ptr()).collect();
        argv_ptr.push(ptr::null());
        unsafe { libc::execv(self.prog.as_ptr(), argv_ptr.as_ptr()) };
        io::Error::last_os_error()
    }
}
