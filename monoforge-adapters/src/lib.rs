pub mod maven;
pub mod node;
pub mod poetry;

pub use maven::MavenAdapter;
pub use node::NodeAdapter;
pub use poetry::PoetryAdapter;

use monoforge_core::adapter::EcosystemAdapter;
use monoforge_core::project::{Ecosystem, Language};

pub fn get_adapter(language: &Language) -> Box<dyn EcosystemAdapter> {
    match language.ecosystem() {
        Ecosystem::Maven => Box::new(MavenAdapter),
        Ecosystem::Poetry => Box::new(PoetryAdapter),
        Ecosystem::Node => Box::new(NodeAdapter),
    }
}
