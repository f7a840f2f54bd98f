//! Build script for iio-sys FFI bindings.
//!
//! With the `iio-sdk` feature, libiio is located once (pkg-config, then the
//! macOS framework, then well-known prefixes), linked, and `iio.h` is run
//! through bindgen. Without it, placeholder bindings are written so the
//! crate builds on hosts that have no libiio.
//!
//! `IIO_INCLUDE_DIR` and `IIO_LIB_DIR` override the search.

use std::env;
use std::path::PathBuf;

/// Oldest libiio whose API matches `iio.h` as bound here.
#[cfg(feature = "iio-sdk")]
const MIN_LIBIIO_VERSION: &str = "0.21";

/// Where libiio was found.
#[cfg(feature = "iio-sdk")]
struct LibIio {
    include_dirs: Vec<PathBuf>,
    /// Extra clang arguments (framework search paths on macOS)
    clang_args: Vec<String>,
}

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rerun-if-env-changed=IIO_INCLUDE_DIR");
    println!("cargo:rerun-if-env-changed=IIO_LIB_DIR");

    #[cfg(feature = "iio-sdk")]
    {
        let lib = locate_libiio();
        generate_bindings(&lib);
    }

    #[cfg(not(feature = "iio-sdk"))]
    generate_dummy_bindings();
}

/// Find libiio, emit the link directives, and report the header location.
#[cfg(feature = "iio-sdk")]
fn locate_libiio() -> LibIio {
    let include_override = env::var_os("IIO_INCLUDE_DIR").map(PathBuf::from);

    if let Some(lib_dir) = env::var_os("IIO_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", PathBuf::from(lib_dir).display());
        println!("cargo:rustc-link-lib=iio");
        return LibIio {
            include_dirs: include_override.into_iter().collect(),
            clang_args: Vec::new(),
        };
    }

    // pkg-config emits its own link directives on success
    if let Ok(lib) = pkg_config::Config::new()
        .atleast_version(MIN_LIBIIO_VERSION)
        .probe("libiio")
    {
        return LibIio {
            include_dirs: include_override.into_iter().chain(lib.include_paths).collect(),
            clang_args: Vec::new(),
        };
    }

    // The macOS installer ships libiio as iio.framework
    let framework = PathBuf::from("/Library/Frameworks/iio.framework");
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos") && framework.exists() {
        println!("cargo:rustc-link-search=framework=/Library/Frameworks");
        println!("cargo:rustc-link-lib=framework=iio");
        return LibIio {
            include_dirs: include_override
                .into_iter()
                .chain(std::iter::once(framework.join("Headers")))
                .collect(),
            clang_args: vec!["-F/Library/Frameworks".to_string()],
        };
    }

    println!("cargo:rustc-link-lib=iio");
    let prefixes = [
        "/usr/local/lib",
        "/usr/lib",
        "/usr/lib/x86_64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
        "/usr/lib/arm-linux-gnueabihf",
    ];
    if let Some(dir) = prefixes
        .iter()
        .map(PathBuf::from)
        .find(|dir| dir.join("libiio.so").exists() || dir.join("libiio.a").exists())
    {
        println!("cargo:rustc-link-search=native={}", dir.display());
    }

    let headers = ["/usr/local/include", "/usr/include"]
        .iter()
        .map(PathBuf::from)
        .filter(|dir| dir.join("iio.h").exists());
    LibIio {
        include_dirs: include_override.into_iter().chain(headers).collect(),
        clang_args: Vec::new(),
    }
}

#[cfg(feature = "iio-sdk")]
fn generate_bindings(lib: &LibIio) {
    for dir in &lib.include_dirs {
        println!("cargo:rerun-if-changed={}", dir.join("iio.h").display());
    }

    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_args(lib.include_dirs.iter().map(|dir| format!("-I{}", dir.display())))
        .clang_args(lib.clang_args.iter())
        .allowlist_function("iio_.*")
        .allowlist_type("iio_.*")
        .allowlist_var("IIO_.*")
        // Handles are only ever used behind pointers
        .opaque_type("iio_context")
        .opaque_type("iio_device")
        .opaque_type("iio_channel")
        .opaque_type("iio_buffer")
        .default_enum_style(bindgen::EnumVariation::Consts)
        .size_t_is_usize(true)
        .derive_debug(true)
        .derive_default(true)
        .derive_copy(true)
        .generate_comments(true)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .expect("Unable to generate libiio bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Couldn't write libiio bindings");
}

/// Generate dummy bindings when the SDK is not available.
/// This allows the crate to compile on systems without libiio installed.
#[cfg(not(feature = "iio-sdk"))]
fn generate_dummy_bindings() {
    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let dummy = r#"
// Dummy bindings - iio-sdk feature not enabled
//
// Placeholder types and functions that allow the crate to compile without
// the libiio headers. Enable the `iio-sdk` feature to generate real bindings.

use std::os::raw::{c_char, c_int, c_longlong, c_uint, c_void};

/// Opaque handle to an IIO context
#[repr(C)]
pub struct iio_context {
    _unused: [u8; 0],
}

/// Opaque handle to an IIO device
#[repr(C)]
pub struct iio_device {
    _unused: [u8; 0],
}

/// Opaque handle to an IIO channel
#[repr(C)]
pub struct iio_channel {
    _unused: [u8; 0],
}

/// Opaque handle to an IIO buffer
#[repr(C)]
pub struct iio_buffer {
    _unused: [u8; 0],
}

/// Sample layout of a channel inside a buffer
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct iio_data_format {
    pub length: c_uint,
    pub bits: c_uint,
    pub shift: c_uint,
    pub is_signed: bool,
    pub is_fully_defined: bool,
    pub is_be: bool,
    pub with_scale: bool,
    pub scale: f64,
    pub repeat: c_uint,
}

// Panic stub implementations - these allow linking to succeed but will panic at runtime
// if called without the iio-sdk feature enabled.

const IIO_SDK_PANIC_MSG: &str = "libiio function called but iio-sdk feature is not enabled. \
    Enable the iio-sdk feature (or hardware in daq-driver-iio) to use the real libiio library.";

#[no_mangle]
pub unsafe extern "C" fn iio_create_context_from_uri(_uri: *const c_char) -> *mut iio_context {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_context_destroy(_ctx: *mut iio_context) {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_context_get_description(_ctx: *const iio_context) -> *const c_char {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_context_get_attrs_count(_ctx: *const iio_context) -> c_uint {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_context_get_attr(
    _ctx: *const iio_context,
    _index: c_uint,
    _name: *mut *const c_char,
    _value: *mut *const c_char,
) -> c_int {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_context_get_devices_count(_ctx: *const iio_context) -> c_uint {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_context_get_device(
    _ctx: *const iio_context,
    _index: c_uint,
) -> *mut iio_device {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_context_find_device(
    _ctx: *const iio_context,
    _name: *const c_char,
) -> *mut iio_device {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_device_get_id(_dev: *const iio_device) -> *const c_char {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_device_get_name(_dev: *const iio_device) -> *const c_char {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_device_get_channels_count(_dev: *const iio_device) -> c_uint {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_device_get_channel(
    _dev: *const iio_device,
    _index: c_uint,
) -> *mut iio_channel {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_device_find_channel(
    _dev: *const iio_device,
    _name: *const c_char,
    _output: bool,
) -> *mut iio_channel {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_device_create_buffer(
    _dev: *const iio_device,
    _samples_count: usize,
    _cyclic: bool,
) -> *mut iio_buffer {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_get_id(_chn: *const iio_channel) -> *const c_char {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_is_output(_chn: *const iio_channel) -> bool {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_enable(_chn: *mut iio_channel) {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_is_enabled(_chn: *const iio_channel) -> bool {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_find_attr(
    _chn: *const iio_channel,
    _name: *const c_char,
) -> *const c_char {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_attr_write(
    _chn: *const iio_channel,
    _attr: *const c_char,
    _src: *const c_char,
) -> isize {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_attr_write_longlong(
    _chn: *const iio_channel,
    _attr: *const c_char,
    _val: c_longlong,
) -> c_int {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_attr_read_longlong(
    _chn: *const iio_channel,
    _attr: *const c_char,
    _val: *mut c_longlong,
) -> c_int {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_channel_get_data_format(
    _chn: *const iio_channel,
) -> *const iio_data_format {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_buffer_refill(_buf: *mut iio_buffer) -> isize {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_buffer_destroy(_buf: *mut iio_buffer) {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_buffer_step(_buf: *const iio_buffer) -> isize {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_buffer_start(_buf: *const iio_buffer) -> *mut c_void {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_buffer_end(_buf: *const iio_buffer) -> *mut c_void {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_buffer_first(
    _buf: *const iio_buffer,
    _chn: *const iio_channel,
) -> *mut c_void {
    panic!("{}", IIO_SDK_PANIC_MSG);
}

#[no_mangle]
pub unsafe extern "C" fn iio_strerror(_err: c_int, _dst: *mut c_char, _len: usize) {
    panic!("{}", IIO_SDK_PANIC_MSG);
}
"#;

    std::fs::write(out_path.join("bindings.rs"), dummy).expect("Couldn't write dummy bindings!");
}
