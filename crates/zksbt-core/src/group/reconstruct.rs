use ark_bn254::Fr;
use std::collections::VecDeque;
use tracing::{debug, info};
use zksbt_types::{ZksbtError, ZksbtResult};

use super::tree::{IncrementalMerkleTree, MerkleProof};
use crate::addressing::{unpack, PoolKey};
use crate::field::fr_to_decimal;
use crate::ledger::{EventCursor, Ledger, MemberInserted};

/// The pool's tree as it stood when its root matched the requested one.
#[derive(Clone, Debug)]
pub struct MerkleGroup {
    pool: PoolKey,
    tree: IncrementalMerkleTree,
}

impl MerkleGroup {
    /// Group over an already known member list, in insertion order.
    pub fn from_leaves(
        pool: PoolKey,
        depth: usize,
        leaves: impl IntoIterator<Item = Fr>,
    ) -> ZksbtResult<Self> {
        let mut tree = IncrementalMerkleTree::new(depth)?;
        for leaf in leaves {
            tree.insert(leaf)?;
        }
        Ok(Self { pool, tree })
    }

    pub fn pool(&self) -> &PoolKey {
        &self.pool
    }

    pub fn root(&self) -> Fr {
        self.tree.root()
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn members(&self) -> &[Fr] {
        self.tree.leaves()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn index_of(&self, leaf: &Fr) -> Option<usize> {
        self.tree.index_of(leaf)
    }

    pub fn proof(&self, index: usize) -> ZksbtResult<MerkleProof> {
        self.tree.proof(index)
    }
}

/// Pulls member-inserted events one page at a time. The next page is only
/// requested once the buffered one has been consumed.
pub struct EventStream<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    pool: PoolKey,
    buffer: VecDeque<MemberInserted>,
    next: Option<EventCursor>,
    pages: u64,
}

impl<'a, L: Ledger + ?Sized> EventStream<'a, L> {
    pub fn new(ledger: &'a L, pool: PoolKey) -> Self {
        Self {
            ledger,
            pool,
            buffer: VecDeque::new(),
            next: Some(EventCursor::start()),
            pages: 0,
        }
    }

    pub async fn next_event(&mut self) -> ZksbtResult<Option<MemberInserted>> {
        loop {
            if let Some(event) = self.buffer.pop_front() {
                return Ok(Some(event));
            }
            let Some(cursor) = self.next else {
                return Ok(None);
            };
            let page = self.ledger.member_inserted_events(&self.pool, cursor).await?;
            self.pages += 1;
            debug!(
                "Fetched event page {} for pool {} ({} events)",
                self.pages,
                self.pool,
                page.events.len()
            );
            self.buffer.extend(page.events);
            self.next = page.next;
        }
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages
    }
}

/// Rebuilds a pool's tree from the ledger's event log until its root equals
/// a target root.
pub struct GroupReconstructor<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> GroupReconstructor<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    pub async fn reconstruct(
        &self,
        pool: &PoolKey,
        depth: usize,
        target_root: Fr,
    ) -> ZksbtResult<MerkleGroup> {
        let mut tree = IncrementalMerkleTree::new(depth)?;
        if tree.root() == target_root {
            debug!("Pool {} matches the empty root", pool);
            return Ok(MerkleGroup {
                pool: pool.clone(),
                tree,
            });
        }

        let wanted = pool.metadata();
        let mut stream = EventStream::new(self.ledger, pool.clone());
        let mut events_scanned = 0u64;

        while let Some(event) = stream.next_event().await? {
            events_scanned += 1;
            if unpack(event.token) != wanted {
                continue;
            }
            tree.insert(event.leaf)?;
            if tree.root() == target_root {
                info!(
                    "Reconstructed pool {} with {} members after {} events",
                    pool,
                    tree.len(),
                    events_scanned
                );
                return Ok(MerkleGroup {
                    pool: pool.clone(),
                    tree,
                });
            }
        }

        Err(ZksbtError::RootMismatch {
            pool: pool.to_string(),
            target_root: fr_to_decimal(&target_root),
            events_scanned,
            members: tree.len(),
        })
    }
}
