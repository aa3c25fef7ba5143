//! Statement coverage profile parsing.
//!
//! Reads the line-oriented profile written by `go test -coverprofile`:
//!
//! ```text
//! mode: set
//! github.com/acme/widgets/pkg/file.go:8.1,12.2 1 1
//! ```

mod profile;

pub use profile::{parse_profile, parse_profile_str, CoverageProfile};
