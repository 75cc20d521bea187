//! A View of a Matroska file, parsing w/o loading clusters into memory.

use crate::element::Element;
use crate::master::*;

/// View of a Matroska file, parsing the EBML and Segment headers, but not loading Clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct MatroskaView {
    /// The EBML header.
    pub ebml: Ebml,
    /// The Segment views, as there can be multiple segments in a Matroska file.
    pub segments: Vec<SegmentView>,
}

impl MatroskaView {
    /// Create a new MatroskaView by parsing the EBML header and all Segment headers,
    /// but skipping Cluster data to avoid loading it into memory.
    pub fn new<R>(reader: &mut R) -> crate::Result<Self>
    where
        R: std::io::Read + std::io::Seek,
    {
        use crate::io::blocking::*;

        // Read the EBML header
        let ebml = Ebml::read_from(reader)?;

        let mut segments = Vec::new();

        // Parse all segments in the file
        while let Ok(segment) = SegmentView::new(reader) {
            segments.push(segment);
        }

        // At least one segment is required
        if segments.is_empty() {
            return Err(crate::Error::MissingElement(Segment::ID));
        }

        Ok(MatroskaView {
            ebml,
            segments,
        })
    }

    /// Create a new MatroskaView by parsing the EBML header and all Segment headers,
    /// but skipping Cluster data to avoid loading it into memory.
    #[cfg(feature = "tokio")]
    #[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
    pub async fn new_async<R>(reader: &mut R) -> crate::Result<Self>
    where
        R: tokio::io::AsyncRead + tokio::io::AsyncSeek + Unpin,
    {
        use crate::io::tokio_impl::*;

        // Read the EBML header
        let ebml = Ebml::async_read_from(reader).await?;

        let mut segments = Vec::new();

        // Parse all segments in the file
        while let Ok(segment) = SegmentView::new_async(reader).await {
            segments.push(segment);
        }

        // At least one segment is required
        if segments.is_empty() {
            return Err(crate::Error::MissingElement(Segment::ID));
        }

        Ok(MatroskaView {
            ebml,
            segments,
        })
    }
}

/// View of a Segment, parsing the Segment header, but not loading Clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentView {
    /// Contains seeking information of Top-Level Elements; see data-layout.
    pub seek_head: Vec<SeekHead>,
    /// Contains general information about the Segment.
    pub info: Info,
    /// A Top-Level Element describing every track carried by the Segment.
    pub tracks: Tracks,
    /// Files attached to the Segment.
    pub attachments: Option<Attachments>,
    /// The position of the first Cluster in the Segment.
    pub first_cluster_position: u64,
    /// The position of the Segment data (after the Segment header).
    pub segment_data_position: u64,
}

impl SegmentView {
    /// Create a new SegmentView by parsing the Segment header and metadata elements,
    /// but skipping Cluster data to avoid loading it into memory.
    pub fn new<R>(reader: &mut R) -> crate::Result<Self>
    where
        R: std::io::Read + std::io::Seek,
    {
        use crate::io::blocking::*;

        // Read the Segment header
        let segment_header = crate::base::Header::read_from(reader)?;
        if segment_header.id != Segment::ID {
            return Err(crate::Error::MissingElement(Segment::ID));
        }

        let segment_data_position = reader.stream_position()?;

        let mut seek_head = Vec::new();
        let mut info = None;
        let mut tracks = None;
        let mut attachments = None;
        let mut first_cluster_position = None;

        // Parse segment elements
        loop {
            let current_position = reader.stream_position()?;

            // Check if we've reached the end of the segment
            if let Ok(header) = crate::base::Header::read_from(reader) {
                match header.id {
                    SeekHead::ID => {
                        let element = SeekHead::read_element(&header, reader)?;
                        seek_head.push(element);
                    }
                    Info::ID => {
                        let element = Info::read_element(&header, reader)?;
                        info = Some(element);
                    }
                    Tracks::ID => {
                        let element = Tracks::read_element(&header, reader)?;
                        tracks = Some(element);
                    }
                    Attachments::ID => {
                        let element = Attachments::read_element(&header, reader)?;
                        attachments = Some(element);
                    }
                    MemoryCluster::ID => {
                        // Found the first cluster, record its position and stop parsing
                        if first_cluster_position.is_none() {
                            first_cluster_position = Some(current_position);
                        }
                        break;
                    }
                    _ => {
                        use log::warn;
                        use std::io::Read;
                        // Skip unknown elements, here we read and discard the data for efficiency
                        std::io::copy(&mut reader.take(*header.size), &mut std::io::sink())?;
                        warn!("Skipped unknown element with ID: {}", header.id);
                    }
                }
            } else {
                // End of stream or error reading header
                break;
            }
        }

        // Info and Tracks are required in a valid document
        let info = info.ok_or(crate::Error::MissingElement(Info::ID))?;
        let tracks = tracks.ok_or(crate::Error::MissingElement(Tracks::ID))?;

        Ok(SegmentView {
            seek_head,
            info,
            tracks,
            attachments,
            first_cluster_position: first_cluster_position.unwrap_or(0),
            segment_data_position,
        })
    }

    /// Create a new SegmentView by parsing the Segment header and metadata elements,
    /// but skipping Cluster data to avoid loading it into memory.
    #[cfg(feature = "tokio")]
    #[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
    pub async fn new_async<R>(reader: &mut R) -> crate::Result<Self>
    where
        R: tokio::io::AsyncRead + tokio::io::AsyncSeek + Unpin,
    {
        use crate::io::tokio_impl::*;
        use tokio::io::AsyncSeekExt;

        // Read the Segment header
        let segment_header = crate::base::Header::async_read_from(reader).await?;
        if segment_header.id != Segment::ID {
            return Err(crate::Error::MissingElement(Segment::ID));
        }

        let segment_data_position = reader.stream_position().await?;

        let mut seek_head = Vec::new();
        let mut info = None;
        let mut tracks = None;
        let mut attachments = None;
        let mut first_cluster_position = None;

        // Parse segment elements
        loop {
            let current_position = reader.stream_position().await?;

            // Check if we've reached the end of the segment
            if let Ok(header) = crate::base::Header::async_read_from(reader).await {
                match header.id {
                    SeekHead::ID => {
                        let element = SeekHead::async_read_element(&header, reader).await?;
                        seek_head.push(element);
                    }
                    Info::ID => {
                        let element = Info::async_read_element(&header, reader).await?;
                        info = Some(element);
                    }
                    Tracks::ID => {
                        let element = Tracks::async_read_element(&header, reader).await?;
                        tracks = Some(element);
                    }
                    Attachments::ID => {
                        let element = Attachments::async_read_element(&header, reader).await?;
                        attachments = Some(element);
                    }
                    MemoryCluster::ID => {
                        // Found the first cluster, record its position and stop parsing
                        if first_cluster_position.is_none() {
                            first_cluster_position = Some(current_position);
                        }
                        break;
                    }
                    _ => {
                        use log::warn;
                        use tokio::io::AsyncReadExt;
                        // Skip unknown elements, here we read and discard the data for efficiency
                        tokio::io::copy(&mut reader.take(*header.size), &mut tokio::io::sink())
                            .await?;
                        warn!("Skipped unknown element with ID: {}", header.id);
                    }
                }
            } else {
                // End of stream or error reading header
                break;
            }
        }

        // Info and Tracks are required in a valid document
        let info = info.ok_or(crate::Error::MissingElement(Info::ID))?;
        let tracks = tracks.ok_or(crate::Error::MissingElement(Tracks::ID))?;

        Ok(SegmentView {
            seek_head,
            info,
            tracks,
            attachments,
            first_cluster_position: first_cluster_position.unwrap_or(0),
            segment_data_position,
        })
    }
}
