//! Recursive block-tree resolution.
//!
//! Children are fetched strictly sequentially, one block at a time, so the
//! resolved tree is a deterministic function of remote state and the
//! remote never sees request bursts. A failure while fetching one block's
//! children is absorbed: that block gets an empty child list and the rest
//! of the tree still resolves.
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;

use crate::notion::model::Block;
use crate::notion::ContentSource;

/// Defensive nesting ceiling. Notion trees are shallow in practice; blocks
/// at the ceiling keep `has_children` set but get no children attached.
pub const MAX_DEPTH: usize = 50;

/// Materialize the full tree under a page's root blocks, preserving
/// sibling order exactly as returned by the source.
pub async fn resolve_tree(source: &dyn ContentSource, blocks: Vec<Block>) -> Vec<Block> {
    let mut resolved = Vec::with_capacity(blocks.len());
    for block in blocks {
        resolved.push(resolve_block(source, block, 0).await);
    }
    resolved
}

fn resolve_block<'a>(
    source: &'a dyn ContentSource,
    mut block: Block,
    depth: usize,
) -> BoxFuture<'a, Block> {
    async move {
        if !block.has_children {
            return block;
        }
        if depth >= MAX_DEPTH {
            warn!(
                block_id = %block.id,
                depth,
                "nesting ceiling reached; leaving children unresolved"
            );
            return block;
        }

        let children = match source.fetch_block_children(&block.id).await {
            Ok(children) => children,
            Err(err) => {
                warn!(
                    block_id = %block.id,
                    error = %err,
                    "failed to fetch children; continuing with empty list"
                );
                block.children = Vec::new();
                return block;
            }
        };

        let mut resolved = Vec::with_capacity(children.len());
        for child in children {
            resolved.push(resolve_block(source, child, depth + 1).await);
        }
        block.children = resolved;
        block
    }
    .boxed()
}
