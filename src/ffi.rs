//! FFI bindings for Solvetrace
//!
//! C-compatible entry points for calling the analytics engine from the
//! recorder or reporting layers. All functions take null-terminated C strings.
//! Returned strings are heap allocated and must be released with
//! `solvetrace_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapter::parse_session;
use crate::aggregator::SegmentAggregator;
use crate::error::AnalyticsError;
use crate::pipeline::{session_to_report, SessionAnalyzer};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a result across the boundary, recording the error on failure
fn finish(result: Result<String, AnalyticsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze session JSON and return report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `solvetrace_free_string`.
/// - Returns NULL on error; call `solvetrace_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_analyze(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(session_to_report(json_str))
}

/// Aggregate session JSON and return only the analytics record as JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `solvetrace_free_string`.
/// - Returns NULL on error; call `solvetrace_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_aggregate(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = parse_session(&json_str).and_then(|session| {
        let analytics = SegmentAggregator::aggregate_session(&session);
        serde_json::to_string(&analytics).map_err(AnalyticsError::JsonError)
    });
    finish(result)
}

// ============================================================================
// Analyzer API
// ============================================================================

/// Opaque handle to a SessionAnalyzer
pub struct SessionAnalyzerHandle {
    inner: SessionAnalyzer,
}

/// Create a new analyzer. Every report it produces shares one instance id.
///
/// # Safety
/// - Returns a pointer that must be freed with `solvetrace_analyzer_free`.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_analyzer_new() -> *mut SessionAnalyzerHandle {
    clear_last_error();
    Box::into_raw(Box::new(SessionAnalyzerHandle {
        inner: SessionAnalyzer::new(),
    }))
}

/// Free an analyzer.
///
/// # Safety
/// - `analyzer` must be a pointer returned by `solvetrace_analyzer_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_analyzer_free(analyzer: *mut SessionAnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Analyze session JSON with an analyzer and return report JSON.
///
/// # Safety
/// - `analyzer` must be a valid pointer from `solvetrace_analyzer_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `solvetrace_free_string`.
/// - Returns NULL on error; call `solvetrace_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_analyzer_analyze(
    analyzer: *mut SessionAnalyzerHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let handle = &*analyzer;
    finish(handle.inner.analyze_to_json(&json_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Solvetrace functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Solvetrace function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Solvetrace function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Solvetrace library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn solvetrace_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_session_json() -> CString {
        CString::new(
            r#"[
                {"type": "paused", "duration": 5},
                {"type": "writing", "duration": 20},
                {"type": "paused", "duration": 3},
                {"type": "erasing", "duration": 2, "metadata": {"isRework": true}},
                {"type": "writing", "duration": 10}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_analyze() {
        let json = sample_session_json();

        unsafe {
            let result = solvetrace_analyze(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let payload: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(payload["analytics"]["totalTime"], 40.0);
            assert_eq!(payload["producer"]["name"], "solvetrace");

            solvetrace_free_string(result);
        }
    }

    #[test]
    fn test_ffi_aggregate() {
        let json = sample_session_json();

        unsafe {
            let result = solvetrace_aggregate(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let payload: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(payload["firstReactionTime"], 5.0);
            assert_eq!(payload["reworkCount"], 1);
            assert!(payload.get("producer").is_none());

            solvetrace_free_string(result);
        }
    }

    #[test]
    fn test_ffi_analyzer_lifecycle() {
        unsafe {
            let analyzer = solvetrace_analyzer_new();
            assert!(!analyzer.is_null());

            let json = sample_session_json();
            let first = solvetrace_analyzer_analyze(analyzer, json.as_ptr());
            let second = solvetrace_analyzer_analyze(analyzer, json.as_ptr());
            assert!(!first.is_null());
            assert!(!second.is_null());

            let first_value: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(first).to_str().unwrap()).unwrap();
            let second_value: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(second).to_str().unwrap()).unwrap();
            assert_eq!(
                first_value["producer"]["instance_id"],
                second_value["producer"]["instance_id"]
            );

            solvetrace_free_string(first);
            solvetrace_free_string(second);
            solvetrace_analyzer_free(analyzer);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = solvetrace_analyze(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = solvetrace_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_null_pointers() {
        unsafe {
            assert!(solvetrace_analyze(ptr::null()).is_null());
            assert!(!solvetrace_last_error().is_null());

            let json = sample_session_json();
            assert!(solvetrace_analyzer_analyze(ptr::null_mut(), json.as_ptr()).is_null());

            solvetrace_free_string(ptr::null_mut());
            solvetrace_analyzer_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = solvetrace_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, env!("CARGO_PKG_VERSION"));
        }
    }
}
