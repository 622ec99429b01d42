//! Information about this shell project.

/// The formal name of this product.
pub const PRODUCT_NAME: &str = "hush";

/// The version of the product, in string form.
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Info regarding the specific version of sources used to build this product.
pub const PRODUCT_GIT_VERSION: &str =
    git_version::git_version!(prefix = "git:", fallback = "unknown");

/// One-line description of the product and its version.
pub const PRODUCT_DISPLAY_STR: &str = const_format::concatcp!(
    PRODUCT_NAME,
    " version ",
    PRODUCT_VERSION,
    " (",
    PRODUCT_GIT_VERSION,
    ")"
);
