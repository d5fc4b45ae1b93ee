use anyhow::Context;
use cwrap::pipeline::Pipeline;
use indexmap::IndexMap;
use std::path::Path;

/// Converts the C++ header at `src` and writes the three artifacts next to
/// `dest_no_ext` (which should have no extension): `<dest>.h`, `<dest>.cpp`,
/// and `<dest>.json`. `implementation_header` points to a file containing
/// the initial header block for the implementation, which is prepended to
/// the generated thunks.
pub fn convert_header_file(
    src: &Path,
    dest_no_ext: &Path,
    implementation_header: &Path,
) -> Result<(), anyhow::Error> {
    let source = std::fs::read_to_string(src)
        .with_context(|| format!("failed to read source header {}", src.display()))?;
    let template = std::fs::read_to_string(implementation_header).with_context(|| {
        format!(
            "failed to read implementation template {}",
            implementation_header.display()
        )
    })?;

    // The primary output file is presumed to be the .h
    let filename = dest_no_ext
        .file_name()
        .map(|name| format!("{}.h", name.to_string_lossy()))
        .unwrap_or_else(|| "output.h".to_string());

    // The varargs list variant of `appendf` is `appendfv`, not `appendfV`
    let custom_varargs_list_suffixes =
        IndexMap::from([("appendf".to_string(), "v".to_string())]);

    let conversion = cwrap::convert_header_source(
        &source,
        &filename,
        &Pipeline::imgui(),
        &custom_varargs_list_suffixes,
    )
    .with_context(|| "conversion failed")?;

    let header_path = dest_no_ext.with_extension("h");
    std::fs::write(&header_path, &conversion.header)
        .with_context(|| format!("failed to write {}", header_path.display()))?;

    let implementation_path = dest_no_ext.with_extension("cpp");
    let mut implementation = template;
    implementation.push_str(&conversion.implementation);
    std::fs::write(&implementation_path, implementation)
        .with_context(|| format!("failed to write {}", implementation_path.display()))?;

    let metadata_path = dest_no_ext.with_extension("json");
    std::fs::write(&metadata_path, &conversion.metadata_json)
        .with_context(|| format!("failed to write {}", metadata_path.display()))?;

    Ok(())
}
