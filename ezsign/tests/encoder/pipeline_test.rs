#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use ezsign::encoder::{compress_block, encode_image, make_fragments, split_blocks};

#[test]
fn split_blocks_partitions_in_order() {
    let buf: Vec<u8> = (0..9472u32).map(|i| i as u8).collect();
    let sizes = fixtures::info_296x128().block_sizes();
    let blocks = split_blocks(&buf, &sizes);

    assert_eq!(blocks.len(), 5);
    let lens: Vec<usize> = blocks.iter().map(Vec::len).collect();
    assert_eq!(lens, sizes);
    assert_eq!(blocks.concat(), buf);
}

#[test]
fn fragment_sizes_for_601_bytes() {
    let frags = make_fragments(&vec![0x5A; 601]);
    let lens: Vec<usize> = frags.iter().map(Vec::len).collect();
    assert_eq!(lens, vec![250, 250, 101]);
}

#[test]
fn fragments_reassemble_to_input() {
    let data: Vec<u8> = (0..1234u32).map(|i| (i * 7) as u8).collect();
    let frags = make_fragments(&data);
    assert!(frags.iter().all(|f| f.len() <= 250));
    assert_eq!(frags.concat(), data);
}

#[test]
fn compressed_block_is_decompressible() {
    let block: Vec<u8> = (0..2000u32).map(|i| (i / 100) as u8).collect();
    let compressed = compress_block(&block).unwrap();
    let mut lzo = minilzo_rs::LZO::init().unwrap();
    assert_eq!(lzo.decompress_safe(&compressed, block.len()).unwrap(), block);
}

#[test]
fn encode_emits_one_group_per_block() {
    let info = fixtures::info_296x128();
    let grid = fixtures::checker_grid(info.width, info.height, 4);
    let groups = encode_image(&grid, &info).unwrap();

    assert_eq!(groups.len(), info.num_blocks());
    for (block_no, group) in groups.iter().enumerate() {
        assert!(!group.is_empty());
        for (frag_no, apdu) in group.iter().enumerate() {
            let is_last = frag_no == group.len() - 1;
            assert_eq!((apdu.cla, apdu.ins), (0xF0, 0xD3));
            assert_eq!(apdu.p1, 0);
            assert_eq!(apdu.p2, if is_last { 0x01 } else { 0x00 });
            let data = apdu.data.as_deref().unwrap();
            assert_eq!(data[0], block_no as u8);
            assert_eq!(data[1], frag_no as u8);
            assert!(data.len() <= 2 + 250);
        }
        // Exactly one final fragment, and it is the last
        let finals = group.iter().filter(|a| a.p2 == 0x01).count();
        assert_eq!(finals, 1);
    }
}

#[test]
fn encode_rotates_the_296x128_family() {
    // A red top row of the logical image lands in the rightmost column of
    // the rotated framebuffer; with the right-to-left byte order and
    // LSB-first packing, that pixel sits in the top bits of byte 0 of
    // every packed row.
    let info = fixtures::info_296x128();
    let mut grid = vec![vec![0u8; info.width]; info.height];
    grid[0] = vec![3u8; info.width];

    let rotated = ezsign::encoder::rotate_cw90(&grid);
    assert_eq!(rotated[0][info.height - 1], 3);
    let packed = ezsign::encoder::pack_pixels(&rotated, info.bits_per_pixel);
    assert_eq!(packed[0], 0xC0);

    let groups = encode_image(&grid, &info).unwrap();
    assert_eq!(groups.len(), info.num_blocks());
}

#[test]
fn single_block_device_encodes_one_group() {
    let info = fixtures::info_small_mono();
    let grid = fixtures::checker_grid(info.width, info.height, 2);
    let groups = encode_image(&grid, &info).unwrap();
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.last().unwrap().p2, 0x01);
    assert!(group[..group.len() - 1].iter().all(|a| a.p2 == 0x00));
}
