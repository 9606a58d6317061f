use nova_jdwp::{Location, VirtualMachine};

use crate::index::ProjectIndex;
use crate::source::SourcePosition;

/// Separator the compiler puts between an outer class and its nested,
/// anonymous or closure classes.
pub const NESTED_SEPARATOR: char = '$';

/// `com.example.Foo$1$_run_closure2` -> `com.example.Foo`.
pub fn top_level_name(runtime_name: &str) -> &str {
    runtime_name
        .split_once(NESTED_SEPARATOR)
        .map_or(runtime_name, |(top, _)| top)
}

/// Source position a runtime location was compiled from.
///
/// The declaring type is mapped to its top-level class, which is looked up in
/// each module in index order; the first module declaring it wins. Returns
/// `None` when the type is unknown to the VM or the project, or when the
/// location carries no usable line.
pub fn source_position_of(
    index: &ProjectIndex,
    vm: &dyn VirtualMachine,
    location: &Location,
) -> Option<SourcePosition> {
    let Some(name) = vm.type_name(location.declaring_type) else {
        tracing::debug!(ty = location.declaring_type, "declaring type has no name");
        return None;
    };
    let top_level = top_level_name(&name);
    let Some(ty) = index.find_class(top_level) else {
        tracing::debug!(class = %name, top_level, "no source for runtime type");
        return None;
    };
    let line = match location.line_number() {
        Ok(line) => line,
        Err(err) => {
            tracing::debug!(class = %name, error = %err, "location has no line");
            return None;
        }
    };
    Some(SourcePosition::from_line(ty.file, line - 1))
}
