//! Directory forest for compound file containers.
//!
//! Entries live in an arena indexed by their dense `stream_id`; the root
//! entry occupies index 0 and is the sole member of a top-level ordered
//! index, and every entry owns the ordered index over its own children.
//! Flattening the forest in the canonical traversal order produces the
//! on-disk directory array.

use crate::consts::*;
use crate::entry::{Entry, EntryName, ObjType};
use crate::error::{CfbError, Result};
use crate::rbtree::{Color, Iter, RbTree};

/// Builder for the directory array of a compound file.
#[derive(Debug)]
pub struct DirectoryBuilder {
    /// Entry arena; the index is the entry's stream_id
    entries: Vec<Entry>,
    /// Top-level index holding only the root entry
    root_index: RbTree<EntryName, u32>,
}

impl DirectoryBuilder {
    /// Create a directory forest holding only the root entry.
    pub fn new() -> Self {
        let root = Entry::root();
        let mut root_index = RbTree::new();
        root_index
            .insert(root.name.clone(), 0)
            .expect("the root index is empty");

        Self {
            entries: vec![root],
            root_index,
        }
    }

    /// Number of directory entries, including the root.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Borrow an entry by stream id.
    #[allow(dead_code)] // Exercised by the test suite
    pub fn entry(&self, stream_id: u32) -> &Entry {
        &self.entries[stream_id as usize]
    }

    /// Resolve a path to the stream id of the entry it names.
    ///
    /// Descends name-by-name through the nested child indexes; the empty
    /// path resolves to the root.
    pub fn find_by_path(&self, path: &[&str]) -> Result<u32> {
        let mut current = 0u32;

        for segment in path {
            let name = EntryName::new(segment);
            current = *self.entries[current as usize]
                .children
                .get(&name)
                .ok_or_else(|| CfbError::PathNotFound {
                    path: path.join("/"),
                })?;
        }

        Ok(current)
    }

    /// Insert a storage entry at `path`, whose parent segments must all
    /// exist already.
    pub fn insert_storage(&mut self, path: &[&str]) -> Result<u32> {
        self.insert(path, |name, stream_id, parent| {
            Entry::storage(name, stream_id, parent)
        })
    }

    /// Insert a stream entry at `path`, recording its allocated chain head
    /// and byte size.
    pub fn insert_stream(&mut self, path: &[&str], sector: u32, size: u64) -> Result<u32> {
        self.insert(path, |name, stream_id, parent| {
            Entry::stream(name, stream_id, parent, sector, size)
        })
    }

    fn insert<F>(&mut self, path: &[&str], make: F) -> Result<u32>
    where
        F: FnOnce(EntryName, u32, u32) -> Entry,
    {
        let (last, parents) = path.split_last().ok_or_else(|| CfbError::PathNotFound {
            path: String::new(),
        })?;

        let parent = self.find_by_path(parents)?;
        if self.entries[parent as usize].obj_type == ObjType::Stream {
            return Err(CfbError::PathNotFound {
                path: parents.join("/"),
            });
        }

        let name = EntryName::new(last);
        let stream_id = self.entries.len() as u32;

        self.entries[parent as usize]
            .children
            .insert(name.clone(), stream_id)
            .map_err(|duplicate| CfbError::DuplicateName {
                name: duplicate.0.to_string(),
            })?;

        self.entries.push(make(name, stream_id, parent));
        Ok(stream_id)
    }

    /// Record the ministream placement on the root entry.
    pub fn set_root_placement(&mut self, sector: u32, size: u64) {
        self.entries[0].sector = sector;
        self.entries[0].size = size;
    }

    /// Canonical flattening order of the forest.
    ///
    /// Siblings are visited in-order by the name comparator; each entry is
    /// followed immediately by the complete traversal of its own child
    /// index, so descendants stay adjacent to their storage. Every entry
    /// appears exactly once, and the iterator can be restarted by calling
    /// `traverse` again.
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse {
            directory: self,
            stack: vec![self.root_index.iter()],
        }
    }

    /// Serialize the directory array.
    ///
    /// Records are laid out at their stream_id offsets and the array is
    /// padded with all-0xFF filler records to a whole multiple of 4
    /// entries, so directory sectors hold a whole number of records.
    pub fn build_directory_stream(&self) -> Vec<u8> {
        let count = self.entries.len();
        let padded = count.div_ceil(DIRENTRY_ALIGN) * DIRENTRY_ALIGN;
        let mut data = vec![0xFFu8; padded * DIRENTRY_SIZE];

        // Sibling links and colors come from each level's ordered index
        let mut links = vec![(NOSTREAM, NOSTREAM, Color::Black); count];
        for index in std::iter::once(&self.root_index)
            .chain(self.entries.iter().map(|entry| &entry.children))
        {
            for projection in index.projections() {
                links[*projection.value as usize] = (
                    projection.left.copied().unwrap_or(NOSTREAM),
                    projection.right.copied().unwrap_or(NOSTREAM),
                    projection.color,
                );
            }
        }

        for stream_id in self.traverse() {
            let entry = &self.entries[stream_id as usize];
            let child = entry.children.root_value().copied().unwrap_or(NOSTREAM);
            let (left, right, color) = links[stream_id as usize];

            let offset = entry.stream_id as usize * DIRENTRY_SIZE;
            data[offset..offset + DIRENTRY_SIZE]
                .copy_from_slice(&entry.to_record(left, right, child, color));
        }

        data
    }
}

impl Default for DirectoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy canonical traversal over the directory forest.
pub struct Traverse<'a> {
    directory: &'a DirectoryBuilder,
    stack: Vec<Iter<'a, EntryName, u32>>,
}

impl Iterator for Traverse<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some((_, &stream_id)) => {
                    self.stack
                        .push(self.directory.entries[stream_id as usize].children.iter());
                    return Some(stream_id);
                },
                None => {
                    self.stack.pop();
                },
            }
        }
    }
}
