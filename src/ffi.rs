//! FFI bindings for embedding hosts
//!
//! C-compatible entry points for calling the engine from other languages.
//! All functions exchange null-terminated C strings; returned strings are
//! allocated here and must be freed by the caller with
//! `sojourn_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::MobilityConfig;
use crate::encoder::FeatureEncoder;
use crate::pipeline::run_window;
use crate::schema::RecordAdapter;
use crate::SOJOURN_VERSION;

/// Per-thread slot holding the most recent failure message, surfaced to the
/// host through `sojourn_last_error`. Each entry point clears the slot on the
/// way in and records into it on the way out.
struct LastError(Option<CString>);

thread_local! {
    static LAST_ERROR: RefCell<LastError> = const { RefCell::new(LastError(None)) };
}

impl LastError {
    fn record(msg: &str) {
        LAST_ERROR.with(|slot| slot.borrow_mut().0 = CString::new(msg).ok());
    }

    fn clear() {
        LAST_ERROR.with(|slot| slot.borrow_mut().0 = None);
    }

    /// Pointer to the recorded message, or null. The string stays owned by
    /// the slot and is only valid until the next engine call on this thread.
    fn as_ptr() -> *const c_char {
        LAST_ERROR.with(|slot| {
            slot.borrow()
                .0
                .as_ref()
                .map_or(ptr::null(), |msg| msg.as_ptr())
        })
    }
}

/// Read a required C-string argument, recording a failure for null or
/// non-UTF-8 input so the caller can bail with NULL directly.
unsafe fn read_arg(ptr: *const c_char, name: &str) -> Option<String> {
    if ptr.is_null() {
        LastError::record(&format!("{} pointer is null", name));
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s.to_string()),
        Err(_) => {
            LastError::record(&format!("{} is not valid UTF-8", name));
            None
        }
    }
}

/// Hand a string to the caller as a newly allocated C string.
fn leak_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Extract daily mobility features from a JSON array of sample records.
///
/// `config_json` may be NULL to use default parameters. Returns a feature
/// report as JSON.
///
/// # Safety
/// - `samples_json` must be a valid null-terminated C string; `config_json`
///   must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `sojourn_free_string`.
/// - Returns NULL on error; call `sojourn_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn sojourn_extract_features(
    samples_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    LastError::clear();

    let samples_str = match read_arg(samples_json, "samples") {
        Some(s) => s,
        None => return ptr::null_mut(),
    };

    let config = if config_json.is_null() {
        MobilityConfig::default()
    } else {
        let config_str = match read_arg(config_json, "config") {
            Some(s) => s,
            None => return ptr::null_mut(),
        };
        match serde_json::from_str(&config_str) {
            Ok(config) => config,
            Err(e) => {
                LastError::record(&format!("Invalid config: {}", e));
                return ptr::null_mut();
            }
        }
    };

    let result = RecordAdapter::parse_array(&samples_str)
        .and_then(|records| RecordAdapter::to_samples(&records))
        .and_then(|samples| run_window(&samples, &config))
        .and_then(|days| FeatureEncoder::new().encode_to_json(days));

    match result {
        Ok(json) => leak_string(&json),
        Err(e) => {
            LastError::record(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the last error message for the calling thread, or NULL if none.
///
/// # Safety
/// The returned pointer is owned by the library and is only valid until the
/// next engine call on the same thread; do not free it.
#[no_mangle]
pub unsafe extern "C" fn sojourn_last_error() -> *const c_char {
    LastError::as_ptr()
}

/// Free a string returned by this library.
///
/// # Safety
/// `ptr` must be a pointer previously returned by an engine function, or
/// NULL.
#[no_mangle]
pub unsafe extern "C" fn sojourn_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Engine version as a newly allocated string (free with
/// `sojourn_free_string`).
#[no_mangle]
pub extern "C" fn sojourn_version() -> *mut c_char {
    leak_string(SOJOURN_VERSION)
}
