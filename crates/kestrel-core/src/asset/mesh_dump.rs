// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loader for raw vertex dump files.
//!
//! The format is deliberately minimal: interleaved vertex bytes, verbatim,
//! no header, no versioning. The vertex count is out-of-band, derived from
//! the caller-supplied layout stride. The only check the format permits is
//! that the byte count divides evenly by that stride.

use crate::asset::AssetError;
use crate::gpu::api::{MeshDescriptor, VertexLayout};
use crate::vfs::FileStore;

/// Loads a raw interleaved vertex dump into a non-indexed mesh descriptor.
pub fn load_vertex_dump(
    files: &FileStore,
    path: &str,
    layout: &VertexLayout,
) -> Result<MeshDescriptor, AssetError> {
    let bytes = files.load(path)?;
    let stride = layout.stride();

    if stride == 0 || bytes.len() % stride as usize != 0 {
        return Err(AssetError::MalformedVertexDump {
            path: path.to_string(),
            len: bytes.len(),
            stride,
        });
    }

    log::debug!(
        "loaded vertex dump '{path}': {} vertices ({} bytes)",
        bytes.len() / stride as usize,
        bytes.len()
    );

    Ok(MeshDescriptor {
        label: path.to_string(),
        layout: layout.clone(),
        vertices: bytes,
        indices: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::api::{VertexAttribute, VertexFormat};
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kestrel-dump-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn position_layout() -> VertexLayout {
        VertexLayout::new(vec![VertexAttribute::new(
            "position",
            VertexFormat::Float32x3,
        )])
    }

    #[test]
    fn derives_the_vertex_count_from_the_stride() {
        let dir = scratch_dir();
        let bytes: Vec<u8> = (0..36).collect(); // 3 vertices of 12 bytes
        fs::write(dir.join("tri.kvd"), &bytes).unwrap();

        let mut files = FileStore::new();
        files.add_directory(&dir);

        let descriptor = load_vertex_dump(&files, "tri.kvd", &position_layout()).unwrap();
        assert_eq!(descriptor.vertices, bytes);
        assert!(descriptor.indices.is_none());
        assert_eq!(
            descriptor.vertices.len() as u32 / descriptor.layout.stride(),
            3
        );
    }

    #[test]
    fn rejects_byte_counts_that_do_not_divide_by_the_stride() {
        let dir = scratch_dir();
        fs::write(dir.join("bad.kvd"), vec![0u8; 35]).unwrap();

        let mut files = FileStore::new();
        files.add_directory(&dir);

        let result = load_vertex_dump(&files, "bad.kvd", &position_layout());
        assert!(matches!(
            result,
            Err(AssetError::MalformedVertexDump { len: 35, .. })
        ));
    }
}
