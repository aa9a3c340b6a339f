use core::ffi;

pub(crate) fn errno() -> i32 {
    // SAFETY: errno_location always points to this thread's errno.
    unsafe { *libc::__errno_location() }
}

pub(crate) fn with_os_error_str<R>(errno: i32, f: impl FnOnce(&str) -> R) -> R {
    let mut buf: [u8; 512] = [0; 512];

    // SAFETY: Our buffer length is passed correctly
    let error = unsafe { libc::strerror_r(errno, buf.as_mut_ptr().cast(), buf.len()) };
    if error != 0 {
        return f("<strerror_r returned an error>");
    }
    // SAFETY: strerror_r wrote a nul terminated string to buf, and we zero
    // initialized it in case it did not.
    let cstr = unsafe { ffi::CStr::from_ptr(buf.as_ptr().cast()) };
    f(cstr
        .to_str()
        .unwrap_or("<error message contained invalid utf8>"))
}

pub(crate) fn with_last_os_error_str<R>(f: impl FnOnce(&str) -> R) -> R {
    with_os_error_str(errno(), f)
}
