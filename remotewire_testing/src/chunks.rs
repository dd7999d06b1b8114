//! Builders for chunked transfers.

use remotewire::message::{Message, ResponseLibraryChunk, ResponseSongFileChunk, SongMetadata};
use sha1::{Digest, Sha1};

/// Lower-case hex SHA-1 of `content`.
#[must_use]
pub fn sha1_hex(content: &[u8]) -> String { hex::encode(Sha1::digest(content)) }

fn chunk_count(content: &[u8], chunk_size: usize) -> u32 {
    u32::try_from(content.chunks(chunk_size.max(1)).count().max(1)).unwrap_or(u32::MAX)
}

/// Offer plus data chunks for one song file.
///
/// The last chunk carries the SHA-1 of `content`.
#[must_use]
pub fn song_transfer(file_number: u32, filename: &str, content: &[u8], chunk_size: usize) -> Vec<Message> {
    let count = chunk_count(content, chunk_size);
    let size = content.len() as u64;
    let hash = sha1_hex(content);
    let mut messages = vec![Message::SongFileChunk(ResponseSongFileChunk {
        chunk_number: 0,
        chunk_count: count,
        file_number,
        size,
        song_metadata: Some(SongMetadata {
            filename: filename.to_owned(),
            file_size: size,
            ..SongMetadata::default()
        }),
        data: Vec::new(),
        file_hash: None,
    })];
    for (number, data) in (1..=count).zip(content.chunks(chunk_size.max(1))) {
        messages.push(Message::SongFileChunk(ResponseSongFileChunk {
            chunk_number: number,
            chunk_count: count,
            file_number,
            size,
            song_metadata: None,
            data: data.to_vec(),
            file_hash: (number == count).then(|| hash.clone()),
        }));
    }
    messages
}

/// Library snapshot chunks for `content`.
#[must_use]
pub fn library_transfer(content: &[u8], chunk_size: usize) -> Vec<Message> {
    let count = chunk_count(content, chunk_size);
    let hash = sha1_hex(content);
    (1..=count)
        .zip(content.chunks(chunk_size.max(1)))
        .map(|(number, data)| {
            Message::LibraryChunk(ResponseLibraryChunk {
                chunk_number: number,
                chunk_count: count,
                size: content.len() as u64,
                data: data.to_vec(),
                file_hash: (number == count).then(|| hash.clone()),
            })
        })
        .collect()
}
