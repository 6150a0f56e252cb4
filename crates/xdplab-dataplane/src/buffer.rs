//! Packet Frame
//!
//! One received frame with head-room in front of the data, modelled on the
//! driver's XDP buffer.
//!
//! # Design
//!
//! - Fixed-size backing store (no allocation per resize)
//! - `start`/`end` are `headroom` and `headroom + data_len`
//! - Resizing takes `&mut self` and hands back a fresh view, so no view
//!   derived before a resize can be used after it

use xdplab_common::{BufferError, ETH_HLEN};

/// Frame buffer size including head-room
pub const FRAME_SIZE: usize = 2048;

/// Default head-room (matches `XDP_PACKET_HEADROOM`)
pub const DEFAULT_HEADROOM: usize = 256;

/// Largest frame that fits after the default head-room
pub const MAX_FRAME_LEN: usize = FRAME_SIZE - DEFAULT_HEADROOM;

/// A single packet frame
pub struct Frame {
    /// Backing store
    data: Box<[u8; FRAME_SIZE]>,
    /// Offset of the first data byte
    headroom: u16,
    /// Data length
    data_len: u16,
    /// Interface the frame arrived on
    ingress_ifindex: u32,
}

impl Frame {
    /// Copy `bytes` into a new frame with the default head-room
    pub fn from_bytes(ingress_ifindex: u32, bytes: &[u8]) -> Result<Self, BufferError> {
        Self::with_headroom(ingress_ifindex, DEFAULT_HEADROOM, bytes)
    }

    /// Copy `bytes` into a new frame with an explicit head-room
    pub fn with_headroom(
        ingress_ifindex: u32,
        headroom: usize,
        bytes: &[u8],
    ) -> Result<Self, BufferError> {
        let capacity = FRAME_SIZE.saturating_sub(headroom);
        if headroom > FRAME_SIZE || bytes.len() > capacity {
            return Err(BufferError::TooLarge {
                len: bytes.len(),
                capacity,
            });
        }

        let mut data = Box::new([0u8; FRAME_SIZE]);
        data[headroom..headroom + bytes.len()].copy_from_slice(bytes);

        Ok(Self {
            data,
            headroom: headroom as u16,
            data_len: bytes.len() as u16,
            ingress_ifindex,
        })
    }

    /// Frame data (`start..end`)
    #[inline(always)]
    pub fn data(&self) -> &[u8] {
        let start = self.headroom as usize;
        let end = start + self.data_len as usize;
        &self.data[start..end]
    }

    /// Mutable frame data
    #[inline(always)]
    pub fn data_mut(&mut self) -> &mut [u8] {
        let start = self.headroom as usize;
        let end = start + self.data_len as usize;
        &mut self.data[start..end]
    }

    /// Data length
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data_len as usize
    }

    /// Check if empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data_len == 0
    }

    /// Bytes available in front of the data
    #[inline(always)]
    pub fn headroom(&self) -> usize {
        self.headroom as usize
    }

    /// Bytes available after the data
    #[inline(always)]
    pub fn tailroom(&self) -> usize {
        FRAME_SIZE - self.headroom as usize - self.data_len as usize
    }

    /// Ingress interface index
    #[inline(always)]
    pub fn ingress_ifindex(&self) -> u32 {
        self.ingress_ifindex
    }

    /// Move the start of the frame by `delta` bytes
    ///
    /// Negative `delta` grows the frame into the head-room, positive
    /// `delta` shrinks it. At least an Ethernet header must remain, as
    /// with `bpf_xdp_adjust_head`. On success returns the re-derived data
    /// view; on failure the frame is unchanged.
    pub fn adjust_head(&mut self, delta: i32) -> Result<&mut [u8], BufferError> {
        let headroom = self.headroom as usize;
        let len = self.data_len as usize;

        if delta < 0 {
            let grow = delta.unsigned_abs() as usize;
            if grow > headroom {
                return Err(BufferError::HeadroomExhausted {
                    requested: grow,
                    available: headroom,
                });
            }
            self.headroom -= grow as u16;
            self.data_len += grow as u16;
        } else {
            let shrink = delta as usize;
            if len < shrink + ETH_HLEN {
                return Err(BufferError::FrameTooShort {
                    needed: shrink + ETH_HLEN,
                    len,
                });
            }
            self.headroom += shrink as u16;
            self.data_len -= shrink as u16;
        }

        Ok(self.data_mut())
    }

    /// Copy the frame data out
    pub fn to_vec(&self) -> Vec<u8> {
        self.data().to_vec()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("ingress_ifindex", &self.ingress_ifindex)
            .field("headroom", &self.headroom)
            .field("len", &self.data_len)
            .finish()
    }
}
