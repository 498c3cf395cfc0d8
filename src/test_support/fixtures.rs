//! Manifest and index fixtures shared by unit tests.

use std::path::Path;

use crate::core::Manifest;

/// The reference package: an executable, a dynamic library and its tests.
pub const SWIFTCLI_MANIFEST: &str = r#"
[package]
name = "SwiftCLI"
tools-version = "5.2"
language-versions = ["5"]

[platforms]
macos = "10.15"

[[products]]
name = "swiftcli"
kind = "executable"
targets = ["swiftcli"]

[[products]]
name = "SwiftCLIKit"
kind = "library"
linkage = "dynamic"
targets = ["SwiftCLIKit"]

[[dependencies]]
url = "https://github.com/apple/swift-argument-parser"
from = "0.0.1"

[[dependencies]]
url = "https://github.com/Quick/Quick"
from = "2.2.0"

[[dependencies]]
url = "https://github.com/Quick/Nimble"
from = "8.0.9"

[[targets]]
name = "swiftcli"
kind = "executable"
dependencies = ["SwiftCLIKit"]

[[targets]]
name = "SwiftCLIKit"
dependencies = [{ product = "ArgumentParser", package = "swift-argument-parser" }]

[[targets]]
name = "SwiftCLIKitTests"
kind = "test"
dependencies = ["SwiftCLIKit", "Quick", "Nimble"]
"#;

/// Three targets depending on each other in a ring.
pub const CYCLIC_MANIFEST: &str = r#"
[package]
name = "Ring"

[[products]]
name = "Ring"
kind = "library"
targets = ["A"]

[[targets]]
name = "A"
dependencies = ["B"]

[[targets]]
name = "B"
dependencies = ["C"]

[[targets]]
name = "C"
dependencies = ["A"]
"#;

/// Releases satisfying every requirement of `SWIFTCLI_MANIFEST`.
///
/// Nimble 9.x is out of range for `from = "8.0.9"`, and Quick 2.2.1 only
/// accepts Nimble 8.0.x, so the single shared Nimble version is 8.0.9.
pub const SWIFTCLI_INDEX: &str = r#"
[[package]]
identity = "swift-argument-parser"
location = "https://github.com/apple/swift-argument-parser"
version = "0.0.1"
revision = "3d79b2b5a2e5af52c14e462044702ea7728f5770"

[[package]]
identity = "swift-argument-parser"
location = "https://github.com/apple/swift-argument-parser"
version = "0.0.6"
revision = "15351c1cd009eba0b6e438bfef55ea9847a8dc4a"

[[package]]
identity = "swift-argument-parser"
location = "https://github.com/apple/swift-argument-parser"
version = "1.0.0"

[[package]]
identity = "quick"
location = "https://github.com/Quick/Quick"
version = "2.2.1"
revision = "09b3becb37cb2163919a3842a4c5fa6ec7130792"
dependencies = [{ url = "https://github.com/Quick/Nimble", up-to-next-minor = "8.0.0" }]

[[package]]
identity = "nimble"
location = "https://github.com/Quick/Nimble"
version = "8.0.9"

[[package]]
identity = "nimble"
location = "https://github.com/Quick/Nimble"
version = "8.1.2"

[[package]]
identity = "nimble"
location = "https://github.com/Quick/Nimble"
version = "9.0.0"
"#;

/// Parse a manifest as if it lived at `/fixture/Package.toml`.
pub fn manifest(content: &str) -> Manifest {
    Manifest::parse(content, Path::new("/fixture/Package.toml")).unwrap()
}
