//! # Juspawn System Utilities Module (`common::system`)
//!
//! File: cli/src/common/system/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Identity of the invoking OS user, used when `--user` / `--uid` are not
//! given on the command line.
//!
//! The username comes from the login environment variables first and, when
//! none is set (cron, systemd units, `env -i`), from the account database
//! entry of the current uid.
//!

/// Environment variables consulted for the login name, in order.
const USERNAME_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// Returns the login name of the invoking user from the first non-empty
/// of `LOGNAME`, `USER`, `LNAME` and `USERNAME`, falling back to the account
/// name of the current uid.
pub fn current_username() -> Option<String> {
    username_from(|var| std::env::var(var).ok(), || account_name(current_uid()))
}

fn username_from(
    lookup: impl Fn(&str) -> Option<String>,
    fallback: impl FnOnce() -> Option<String>,
) -> Option<String> {
    USERNAME_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .find(|value| !value.is_empty())
        .or_else(fallback)
}

/// Account name of `uid` from the password database.
#[cfg(unix)]
pub fn account_name(uid: u32) -> Option<String> {
    use std::ffi::CStr;

    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        // SAFETY: an all-zero passwd is a valid out-parameter; getpwuid_r only
        // writes into `pwd` and `buf`, both of which outlive the call.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut entry: *mut libc::passwd = std::ptr::null_mut();
        let rc = unsafe {
            libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut entry)
        };
        if rc == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || entry.is_null() || pwd.pw_name.is_null() {
            return None;
        }
        // SAFETY: on success pw_name points to a NUL-terminated string in `buf`.
        let name = unsafe { CStr::from_ptr(pwd.pw_name) }
            .to_string_lossy()
            .into_owned();
        return (!name.is_empty()).then_some(name);
    }
}

#[cfg(not(unix))]
pub fn account_name(_uid: u32) -> Option<String> {
    None
}

/// Real user id of the current process.
#[cfg(unix)]
pub fn current_uid() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail.
    unsafe { libc::getuid() }
}

/// Non-unix hosts have no uid; containers fall back to the conventional
/// first user id.
#[cfg(not(unix))]
pub fn current_uid() -> u32 {
    1000
}
