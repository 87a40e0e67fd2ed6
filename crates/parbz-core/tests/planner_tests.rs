use parbz_core::{plan_blocks, BlockPlanner, ParbzError};

#[test]
fn blocks_tile_input_exactly() {
    let planner = BlockPlanner::new(1024).unwrap();
    let blocks = planner.plan(2305);

    assert_eq!(blocks.len(), 3);
    assert_eq!(
        blocks.iter().map(|b| b.length).collect::<Vec<_>>(),
        vec![1024, 1024, 257]
    );

    let mut expected_offset = 0u64;
    for (index, block) in blocks.iter().enumerate() {
        assert_eq!(block.index, index);
        assert_eq!(block.offset, expected_offset);
        expected_offset = block.end();
    }
    assert_eq!(expected_offset, 2305);
}

#[test]
fn exact_multiple_has_no_short_block() {
    let blocks = plan_blocks(4096, 1024).unwrap();
    assert_eq!(blocks.len(), 4);
    assert!(blocks.iter().all(|b| b.length == 1024));
}

#[test]
fn input_smaller_than_block_size_plans_one_block() {
    let blocks = plan_blocks(100, 1024).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].offset, 0);
    assert_eq!(blocks[0].length, 100);
}

#[test]
fn zero_byte_input_plans_zero_blocks() {
    let blocks = plan_blocks(0, 1024).unwrap();
    assert!(blocks.is_empty());
}

#[test]
fn zero_block_size_is_rejected() {
    assert!(matches!(
        BlockPlanner::new(0),
        Err(ParbzError::InvalidConfig(_))
    ));
}

#[test]
fn default_block_size_matches_large_file_count() {
    let block_size = parbz_core::DEFAULT_BLOCK_SIZE as u64;
    let file_size = 10 * block_size + 1;
    let blocks = plan_blocks(file_size, parbz_core::DEFAULT_BLOCK_SIZE).unwrap();
    assert_eq!(blocks.len(), 11);
    assert_eq!(blocks.last().unwrap().length, 1);
}
