// Copyright (c) 2023 Mike Tsao. All rights reserved.

use std::io;

/// A [Transport] is the byte pipe between us and the editor. The engine only
/// ever polls it, so implementations must never block.
pub trait Transport: std::fmt::Debug {
    /// How many bytes could be read right now without blocking. Zero is a
    /// normal answer.
    fn poll_available(&mut self) -> io::Result<usize>;

    /// Reads up to `buf.len()` bytes. Returns how many were read, which can be
    /// fewer than asked for.
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Sends all of `bytes` or fails.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Lets a boxed transport stand in wherever a concrete one is expected.
impl<T: Transport + ?Sized> Transport for Box<T> {
    fn poll_available(&mut self) -> io::Result<usize> {
        (**self).poll_available()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_into(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }
}
