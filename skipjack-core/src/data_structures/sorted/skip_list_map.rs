use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::data_structures::TaggedPtr;
use crate::guard::Guard;

/// Map keys. `i64::MIN` and `i64::MAX` are reserved for the sentinel
/// towers and are rejected by the public operations.
pub type Key = i64;

/// The pair yielded by iteration.
pub type Entry<V> = (Key, V);

const MIN_KEY: Key = i64::MIN;
const MAX_KEY: Key = i64::MAX;

/// Number of levels in the sentinel ladder; towers never grow taller.
/// 2^MAX_LEVEL should exceed the expected population.
const MAX_LEVEL: usize = 22;

/// Default bias of the tower-height coin.
const COIN_P: f64 = 0.5;

type NodePtr<V> = *mut Node<V>;

// =============================================================================
// SKIP LIST MAP INVARIANTS & DELETION PROTOCOL
// =============================================================================
//
// Concurrent ordered map based on Fomitchev and Ruppert's "Lock-Free Linked
// Lists and Skip Lists" (PODC '04). Every level is an independent lock-free
// singly-linked list; a key is represented by a tower of one node per level,
// chained by `down` pointers. Each level is bounded by a MIN_KEY head and a
// MAX_KEY tail sentinel, and the head sentinels form a vertical spine via
// `up` so searches can locate the highest occupied level.
//
// Level 3:  HEAD ───────────────────────────► 30 ──────────────────► TAIL
//             │                                │
// Level 2:  HEAD ──────────► 10 ────────────► 30 ──────────────────► TAIL
//             │               │                │
// Level 1:  HEAD ──────────► 10 ──► 20 ─────► 30 ──────────► 40 ───► TAIL
//
// The successor of every node is a single atomic word carrying the right
// pointer plus a mark bit and a flag bit (see tagged_ptr.rs), so one CAS
// publishes a pointer change together with the state change.
//
// DELETION (three steps, any thread may help finish steps 2 and 3):
//
//   Step 1 - FLAG the predecessor (freezes pred.successor):
//            pred ──F──► victim ──────► next
//
//   Step 2 - record victim.back_link = pred, then MARK the victim
//            (freezes victim.successor; the victim is now logically gone):
//            pred ──F──► victim ──M──► next
//
//   Step 3 - UNLINK with a single CAS on pred that also clears the flag:
//            pred ─────────────────────► next
//
// INVARIANTS:
// 1. Each level is sorted by key (ascending) between its sentinels
// 2. A flagged node's successor cannot change until the flag is cleared by
//    the unlink CAS; a marked node's successor never changes again
// 3. A marked node carries a back_link to a node that was its predecessor
//    when it was flagged; searchers blocked on a marked predecessor restart
//    from there
// 4. The level-1 node of a tower (its root) holds the element and the
//    liveness of the whole key: once the root is marked, every cell of the
//    tower is logically deleted and searchers unlink them on sight
// 5. Sentinels are never flagged, marked, or unlinked
//
// MEMORY RECLAMATION:
// Physically unlinked cells stay allocated; the unlinking thread hands them
// to the map's Guard. DeferredGuard frees them when the map drops, which
// keeps back_link and `down` chains dereferenceable for the map's whole
// lifetime. Cells that are still linked when the map drops (including
// marked ones awaiting lazy cleanup) are freed by the Drop walk instead.
//
// =============================================================================

pub(crate) struct Node<V> {
    key: Key,
    /// Present in tower roots; upper cells and sentinels carry no payload.
    element: Option<V>,
    /// Tagged successor word: (right pointer, mark, flag).
    successor: AtomicPtr<Node<V>>,
    /// Predecessor at the moment this node was flagged. Written once.
    back_link: AtomicPtr<Node<V>>,
    /// Same key, one level below. Null in level-1 nodes.
    down: NodePtr<V>,
    /// Level-1 node of this key's tower; self for roots and sentinels.
    tower_root: NodePtr<V>,
    /// Vertical spine between head sentinels; the top head points to itself.
    /// Null everywhere else. Written only during construction.
    up: NodePtr<V>,
}

impl<V> Node<V> {
    /// Allocate a tower root (level 1): carries the element, is its own
    /// tower root.
    fn new_root(key: Key, element: V) -> NodePtr<V> {
        let node = Box::into_raw(Box::new(Node {
            key,
            element: Some(element),
            successor: AtomicPtr::new(ptr::null_mut()),
            back_link: AtomicPtr::new(ptr::null_mut()),
            down: ptr::null_mut(),
            tower_root: ptr::null_mut(),
            up: ptr::null_mut(),
        }));
        unsafe {
            (*node).tower_root = node;
        }
        node
    }

    /// Allocate an upper tower cell: no payload, linked down to the cell
    /// below and across to the tower root.
    fn new_cell(key: Key, down: NodePtr<V>, tower_root: NodePtr<V>) -> NodePtr<V> {
        Box::into_raw(Box::new(Node {
            key,
            element: None,
            successor: AtomicPtr::new(ptr::null_mut()),
            back_link: AtomicPtr::new(ptr::null_mut()),
            down,
            tower_root,
            up: ptr::null_mut(),
        }))
    }

    /// Allocate a sentinel (MIN_KEY head or MAX_KEY tail).
    fn new_sentinel(key: Key) -> NodePtr<V> {
        let node = Box::into_raw(Box::new(Node {
            key,
            element: None,
            successor: AtomicPtr::new(ptr::null_mut()),
            back_link: AtomicPtr::new(ptr::null_mut()),
            down: ptr::null_mut(),
            tower_root: ptr::null_mut(),
            up: ptr::null_mut(),
        }));
        unsafe {
            (*node).tower_root = node;
        }
        node
    }

    /// Deallocate a node.
    ///
    /// # Safety
    /// - The pointer must have been allocated by one of the constructors above
    /// - Must only be called once, and the node must not be accessed afterwards
    unsafe fn dealloc_ptr(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    // =========================================================================
    // Successor word accessors
    // =========================================================================

    /// Load the successor word (Acquire ordering).
    #[inline]
    fn successor(&self) -> TaggedPtr<Node<V>> {
        TaggedPtr::new(self.successor.load(Ordering::Acquire))
    }

    /// Store the successor word (Release ordering). Only used before a node
    /// is published.
    #[inline]
    fn set_successor(&self, ptr: NodePtr<V>) {
        self.successor.store(ptr, Ordering::Release)
    }

    /// CAS the successor word (Release/Relaxed ordering). Callers re-load
    /// with `successor()` before acting on a failure.
    #[inline]
    fn cas_successor(
        &self,
        expected: NodePtr<V>,
        new: NodePtr<V>,
    ) -> Result<NodePtr<V>, NodePtr<V>> {
        self.successor
            .compare_exchange(expected, new, Ordering::Release, Ordering::Relaxed)
    }

    /// Weak CAS of the successor word, for unconditional retry loops.
    #[inline]
    fn cas_successor_weak(
        &self,
        expected: NodePtr<V>,
        new: NodePtr<V>,
    ) -> Result<NodePtr<V>, NodePtr<V>> {
        self.successor
            .compare_exchange_weak(expected, new, Ordering::Release, Ordering::Relaxed)
    }

    // =========================================================================
    // Back-link accessors
    // =========================================================================

    #[inline]
    fn back_link(&self) -> NodePtr<V> {
        self.back_link.load(Ordering::Acquire)
    }

    #[inline]
    fn set_back_link(&self, pred: NodePtr<V>) {
        self.back_link.store(pred, Ordering::Release)
    }

    /// Whether this node's whole tower is logically deleted: the liveness
    /// bit of a key lives in the mark of its tower root's successor.
    ///
    /// # Safety
    /// `tower_root` must point to a live allocation, which holds for every
    /// node reachable from the list while the caller is pinned.
    #[inline]
    unsafe fn tower_is_deleted(&self) -> bool {
        unsafe { (*self.tower_root).successor().is_marked() }
    }
}

/// A lock-free ordered map from `i64` keys to `Copy` elements.
///
/// Based on Fomitchev and Ruppert's "Lock-Free Linked Lists and Skip Lists"
/// (PODC '04): marked and flagged successor pointers, back-links for restart
/// after deletion, and cooperative helping so that every operation completes
/// in a bounded number of its own steps regardless of the scheduling of
/// other threads.
///
/// The guard type `G` decides when physically unlinked nodes are freed; see
/// the `guard` module.
pub struct SkipListMap<V, G: Guard> {
    /// Bottom-left head sentinel (level 1).
    head: NodePtr<V>,
    /// Bias of the tower-height coin; expected tower height is 1/(1-p).
    coin_p: f64,
    /// Shared guard instance for deferred destruction of unlinked cells.
    guard: G,
}

impl<V: Copy, G: Guard> SkipListMap<V, G> {
    /// Create an empty map with the default (fair) tower-height coin.
    pub fn new() -> Self {
        Self::with_coin_bias(COIN_P)
    }

    /// Create an empty map whose tower-height coin comes up heads with
    /// probability `coin_p`.
    pub fn with_coin_bias(coin_p: f64) -> Self {
        assert!(
            coin_p > 0.0 && coin_p < 1.0,
            "tower coin bias must lie strictly between 0 and 1"
        );
        SkipListMap {
            head: Self::build_sentinel_ladder(),
            coin_p,
            guard: G::default(),
        }
    }

    /// Build the two sentinel chains: one MIN_KEY head and one MAX_KEY tail
    /// per level, each head pointing at its tail, heads chained vertically.
    /// Returns the bottom (level 1) head.
    fn build_sentinel_ladder() -> NodePtr<V> {
        let mut below: NodePtr<V> = ptr::null_mut();
        let mut bottom: NodePtr<V> = ptr::null_mut();

        for _ in 0..MAX_LEVEL {
            let head = Node::new_sentinel(MIN_KEY);
            let tail = Node::new_sentinel(MAX_KEY);
            unsafe {
                (*head).set_successor(tail);
                if below.is_null() {
                    bottom = head;
                } else {
                    (*below).up = head;
                    (*head).down = below;
                }
                below = head;
            }
        }
        unsafe {
            // Top head closes the spine on itself.
            (*below).up = below;
        }
        bottom
    }

    /// Sample a tower height in [1, MAX_LEVEL]: keep flipping the coin while
    /// it comes up heads.
    fn random_tower_height(&self) -> usize {
        if self.coin_p == COIN_P {
            // Fair-coin fast path: one random word, count trailing ones.
            // Each trailing 1 bit is one won flip, so P(height > n) = 2^-n.
            let random_bits = fastrand::u32(..);
            let extra_levels = (!random_bits).trailing_zeros() as usize;
            return (1 + extra_levels).min(MAX_LEVEL);
        }

        let mut height = 1;
        while height < MAX_LEVEL && fastrand::f64() < self.coin_p {
            height += 1;
        }
        height
    }

    // =========================================================================
    // Single-level list primitives
    // =========================================================================

    /// Advance rightward from `curr` until the gap for `key` is found:
    /// returns `(pred, succ)` with `pred.key <= key < succ.key`.
    ///
    /// Whenever the next node belongs to a logically deleted tower, the
    /// search helps finish the deletion before stepping over it, so marked
    /// cells cannot pile up in front of searchers.
    fn search_right(&self, key: Key, mut curr: NodePtr<V>) -> (NodePtr<V>, NodePtr<V>) {
        unsafe {
            let mut next = (*curr).successor().as_ptr();

            while (*next).key <= key {
                while (*next).tower_is_deleted() {
                    let (new_pred, in_list, _did_flag) = self.try_flag(curr, next);
                    curr = new_pred;
                    if in_list {
                        self.help_flagged(curr, next);
                    }
                    next = (*curr).successor().as_ptr();
                }
                if (*next).key <= key {
                    curr = next;
                    next = (*curr).successor().as_ptr();
                }
            }

            (curr, next)
        }
    }

    /// Try to install the deletion flag on `pred`'s successor word while it
    /// points at `target`.
    ///
    /// Returns `(pred, in_list, did_flag)`:
    /// - `in_list`: a flag toward `target` is in place (ours or another
    ///   thread's); `target` is still linked
    /// - `did_flag`: our CAS installed it - the caller owns the deletion
    ///
    /// When `pred` turns out to be marked, walks its back-links to a live
    /// predecessor and relocates `target` from there; if `target` is no
    /// longer in the list, returns `in_list = false`.
    fn try_flag(&self, mut pred: NodePtr<V>, target: NodePtr<V>) -> (NodePtr<V>, bool, bool) {
        unsafe {
            let target_key = (*target).key;
            let flagged = TaggedPtr::new(target).with_flag(true).as_raw();

            loop {
                if (*pred).successor().as_raw() == flagged {
                    return (pred, true, false);
                }

                if (*pred).cas_successor(target, flagged).is_ok() {
                    return (pred, true, true);
                }

                // CAS failed: someone flagged first, marked pred, or changed
                // the neighborhood. Re-read and sort it out.
                let observed = (*pred).successor();
                if observed.as_raw() == flagged {
                    return (pred, true, false);
                }

                while (*pred).successor().is_marked() {
                    pred = (*pred).back_link();
                }

                // Relocate target from the recovered predecessor. Searching
                // for key - 1 lands immediately to its left.
                let (new_pred, neighbor) = self.search_right(target_key - 1, pred);
                pred = new_pred;
                if neighbor != target {
                    // Target was unlinked in the meantime.
                    return (pred, false, false);
                }
            }
        }
    }

    /// Set the mark on `victim`'s successor word. Returns once the mark is
    /// in place, whether we or a helper installed it.
    fn try_mark(&self, victim: NodePtr<V>) {
        unsafe {
            loop {
                let succ = (*victim).successor();
                if succ.is_marked() {
                    return;
                }
                if succ.is_flagged() {
                    // The victim is itself the predecessor of a pending
                    // deletion; finish that first, it clears the flag.
                    self.help_flagged(victim, succ.as_ptr());
                    continue;
                }

                let next = succ.as_ptr();
                let marked = TaggedPtr::new(next).with_mark(true).as_raw();
                if (*victim).cas_successor_weak(next, marked).is_ok() {
                    return;
                }
            }
        }
    }

    /// Finish the deletion of `victim`, whose predecessor `pred` carries the
    /// flag: publish the back-link, mark the victim, unlink it. Idempotent;
    /// every thread that observes the flag runs this.
    fn help_flagged(&self, pred: NodePtr<V>, victim: NodePtr<V>) {
        unsafe {
            (*victim).set_back_link(pred);
            if !(*victim).successor().is_marked() {
                self.try_mark(victim);
            }
        }
        self.help_marked(pred, victim);
    }

    /// Physically unlink the marked `victim` from the flagged `pred` with a
    /// single CAS that also clears the flag. The winning thread hands the
    /// cell to the guard; a successor word points at a given victim under a
    /// flag at most once, so the hand-off happens exactly once.
    fn help_marked(&self, pred: NodePtr<V>, victim: NodePtr<V>) {
        unsafe {
            // The victim is marked, so its successor word is frozen.
            let next = (*victim).successor().as_ptr();
            let flagged = TaggedPtr::new(victim).with_flag(true).as_raw();

            if (*pred).cas_successor(flagged, next).is_ok() {
                self.guard.defer_destroy(victim, Node::dealloc_ptr);
            }
        }
    }

    /// Splice `new_node` between `pred` and `succ`, helping and relocating
    /// past concurrent flags, marks, and splices. Returns `None` when a node
    /// with the same key is already in the list; `pred` and `succ` track the
    /// final neighborhood either way.
    fn insert_node(
        &self,
        new_node: NodePtr<V>,
        pred: &mut NodePtr<V>,
        succ: &mut NodePtr<V>,
    ) -> Option<NodePtr<V>> {
        unsafe {
            let key = (*new_node).key;
            if (**pred).key == key {
                return None;
            }

            loop {
                let pred_succ = (**pred).successor();
                if pred_succ.is_flagged() {
                    // A deletion is pending right after pred; help it
                    // through before trying to splice.
                    self.help_flagged(*pred, pred_succ.as_ptr());
                } else {
                    (*new_node).set_successor(*succ);
                    if (**pred).cas_successor(*succ, new_node).is_ok() {
                        return Some(new_node);
                    }

                    // Splice failed; recover a usable predecessor.
                    let observed = (**pred).successor();
                    if observed.is_flagged() {
                        self.help_flagged(*pred, observed.as_ptr());
                    }
                    while (**pred).successor().is_marked() {
                        *pred = (**pred).back_link();
                    }
                }

                let (p, s) = self.search_right(key, *pred);
                *pred = p;
                *succ = s;
                if (*p).key == key {
                    return None;
                }
            }
        }
    }

    /// Delete `target` from one level: flag its predecessor, then help the
    /// flag through mark and unlink. Only the thread whose CAS installed
    /// the flag reports success, so concurrent removals of the same key
    /// agree on a single winner.
    fn delete_node(&self, pred: NodePtr<V>, target: NodePtr<V>) -> Option<NodePtr<V>> {
        let (pred, in_list, did_flag) = self.try_flag(pred, target);
        if in_list {
            self.help_flagged(pred, target);
        }
        if did_flag { Some(target) } else { None }
    }

    // =========================================================================
    // Multi-level composition
    // =========================================================================

    /// Climb the head spine to the lowest level from which a top-down
    /// search covers level `level`: the first level whose list above is
    /// empty, but no lower than `level`.
    fn find_start(&self, level: usize) -> (NodePtr<V>, usize) {
        let mut curr = self.head;
        let mut curr_level = 1;

        unsafe {
            while curr_level < MAX_LEVEL {
                let up = (*curr).up;
                let first_above = (*(*up).successor().as_ptr()).key;
                if first_above == MAX_KEY && curr_level >= level {
                    break;
                }
                curr = up;
                curr_level += 1;
            }
        }

        (curr, curr_level)
    }

    /// Locate the `(pred, succ)` pair for `key` on `level`, descending from
    /// the highest occupied level. Every level crossed on the way down gets
    /// the side effect of `search_right`'s cleanup.
    fn search_to_level(&self, key: Key, level: usize) -> (NodePtr<V>, NodePtr<V>) {
        let (mut curr, mut curr_level) = self.find_start(level);

        while curr_level > level {
            let (pred, _) = self.search_right(key, curr);
            curr = unsafe { (*pred).down };
            curr_level -= 1;
        }

        self.search_right(key, curr)
    }

    // =========================================================================
    // Public API
    // =========================================================================

    /// Insert `key` mapping to `element`. Returns `true` iff the key was
    /// absent. Reserved sentinel keys are rejected.
    pub fn insert(&self, key: Key, element: V) -> bool {
        if key == MIN_KEY || key == MAX_KEY {
            return false;
        }
        let _pin = G::pin();

        let (mut pred, mut succ) = self.search_to_level(key, 1);
        unsafe {
            if (*pred).key == key {
                return false;
            }

            let root = Node::new_root(key, element);
            let height = self.random_tower_height();
            let mut new_node = root;
            let mut level = 1;

            loop {
                let spliced = self.insert_node(new_node, &mut pred, &mut succ).is_some();

                if !spliced {
                    if level == 1 {
                        // Lost the race to a concurrent insert of this key;
                        // the root was never published.
                        Node::dealloc_ptr(root);
                        return false;
                    }
                    // Same-key debris blocked the splice on this level. The
                    // cell stays in the tower's down chain so descents keep
                    // their level alignment, but it is never linked here;
                    // hand it to the guard with the other unreachable cells
                    // and keep raising the tower.
                    self.guard.defer_destroy(new_node, Node::dealloc_ptr);
                }

                if (*root).successor().is_marked() {
                    // The tower was removed while we were still raising it;
                    // an upper cell we just spliced is an orphan.
                    if spliced && new_node != root {
                        self.delete_node(pred, new_node);
                    }
                    return true;
                }

                level += 1;
                if level == height + 1 {
                    return true;
                }

                let below = new_node;
                new_node = Node::new_cell(key, below, root);

                let (p, s) = self.search_to_level(key, level);
                pred = p;
                succ = s;
            }
        }
    }

    /// Look up `key`. Returns a copy of the element iff the key is live.
    pub fn find(&self, key: Key) -> Option<V> {
        if key == MIN_KEY || key == MAX_KEY {
            return None;
        }
        let _pin = G::pin();

        let (pred, _) = self.search_to_level(key, 1);
        unsafe {
            if (*pred).key == key {
                (*pred).element
            } else {
                None
            }
        }
    }

    /// Remove `key`. Returns the element it mapped to iff the key was live
    /// and this call won the removal.
    pub fn remove(&self, key: Key) -> Option<V> {
        if key == MIN_KEY || key == MAX_KEY {
            return None;
        }
        let _pin = G::pin();

        // Search for key - 1 so the located successor IS the victim rather
        // than the node after it.
        let (pred, target) = self.search_to_level(key - 1, 1);
        unsafe {
            if (*target).key != key {
                return None;
            }

            let element = (*target).element;
            self.delete_node(pred, target)?;

            // The root is gone; a search over the index levels unlinks the
            // upper tower cells on sight. They would also go away lazily,
            // this just front-loads the cleanup.
            self.search_to_level(key, 2);

            element
        }
    }

    /// Iterate over the live entries in ascending key order. The iterator
    /// pins the guard for its whole lifetime.
    ///
    /// Under concurrent mutation the traversal yields every key that is
    /// live at some moment during the iteration; entries removed or
    /// inserted mid-flight may or may not appear.
    pub fn iter(&self) -> Iter<'_, V, G> {
        let pin = G::pin();
        let first = self.first_live();
        Iter {
            _pin: pin,
            map: self,
            node: first,
        }
    }

    /// Number of live entries. Walks the whole level-1 list.
    pub fn len(&self) -> usize {
        let _pin = G::pin();
        let mut count = 0;
        let mut node = self.first_live();
        while !node.is_null() {
            count += 1;
            node = self.next_live(node);
        }
        count
    }

    /// Whether the map currently holds no live entries.
    pub fn is_empty(&self) -> bool {
        let _pin = G::pin();
        self.first_live().is_null()
    }

    // =========================================================================
    // Level-1 traversal helpers
    // =========================================================================

    /// First unmarked level-1 node, or null when the map is empty.
    fn first_live(&self) -> NodePtr<V> {
        unsafe { self.next_live_from((*self.head).successor().as_ptr()) }
    }

    /// Next unmarked level-1 node after `node`, or null at the end.
    fn next_live(&self, node: NodePtr<V>) -> NodePtr<V> {
        unsafe { self.next_live_from((*node).successor().as_ptr()) }
    }

    /// Walk right from `curr` to the first node that is not logically
    /// deleted; null when only the tail remains.
    fn next_live_from(&self, mut curr: NodePtr<V>) -> NodePtr<V> {
        unsafe {
            loop {
                if (*curr).key == MAX_KEY {
                    return ptr::null_mut();
                }
                let succ = (*curr).successor();
                if !succ.is_marked() {
                    return curr;
                }
                curr = succ.as_ptr();
            }
        }
    }
}

impl<V: Copy, G: Guard> Default for SkipListMap<V, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, G: Guard> Drop for SkipListMap<V, G> {
    fn drop(&mut self) {
        // Free every cell still linked on each level, sentinels included.
        // Cells that were physically unlinked are no longer reachable here;
        // the guard field owns those and frees them right after this body.
        unsafe {
            let mut head = self.head;
            loop {
                let up = (*head).up;

                let mut curr = (*head).successor().as_ptr();
                while (*curr).key != MAX_KEY {
                    let next = (*curr).successor().as_ptr();
                    Node::dealloc_ptr(curr);
                    curr = next;
                }
                Node::dealloc_ptr(curr); // tail
                Node::dealloc_ptr(head);

                if up == head {
                    break; // the top head points at itself
                }
                head = up;
            }
        }
    }
}

// Safety: the map is a shared-memory structure; all cross-thread state is
// behind atomics and the guard protocol. Elements are copied out, so V only
// needs to move between threads.
unsafe impl<V: Send, G: Guard> Send for SkipListMap<V, G> {}
unsafe impl<V: Send + Sync, G: Guard> Sync for SkipListMap<V, G> {}

// ============================================================================
// Iterator
// ============================================================================

/// Forward iterator over the live entries of a [`SkipListMap`], in
/// ascending key order. Holds the guard's read protection for its lifetime.
pub struct Iter<'a, V, G: Guard> {
    _pin: G::ReadGuard,
    map: &'a SkipListMap<V, G>,
    node: NodePtr<V>,
}

impl<'a, V: Copy, G: Guard> Iterator for Iter<'a, V, G> {
    type Item = Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node;
        if node.is_null() {
            return None;
        }
        self.node = self.map.next_live(node);

        unsafe {
            let element = (*node)
                .element
                .expect("level-1 data node must carry an element");
            Some(((*node).key, element))
        }
    }
}

// ============================================================================
// Tests - single-threaded behavior; concurrency suites live in common_tests
// ============================================================================

#[cfg(test)]
impl<V: Copy, G: Guard> SkipListMap<V, G> {
    /// Quiescent structural checks: strictly sorted keys on every level,
    /// and every upper cell linked down to a same-key cell sharing its
    /// tower root. Only meaningful with no concurrent operations.
    fn check_structure(&self) {
        unsafe {
            let mut head = self.head;
            let mut level = 1;
            loop {
                let mut prev_key = MIN_KEY;
                let mut curr = (*head).successor().as_ptr();
                while (*curr).key != MAX_KEY {
                    assert!(
                        (*curr).key > prev_key,
                        "keys out of order on level {}",
                        level
                    );
                    prev_key = (*curr).key;

                    if level == 1 {
                        assert_eq!((*curr).tower_root, curr);
                        assert!((*curr).down.is_null());
                    } else {
                        let down = (*curr).down;
                        assert!(!down.is_null(), "upper cell without a down link");
                        assert_eq!((*down).key, (*curr).key);
                        assert_eq!((*down).tower_root, (*curr).tower_root);
                    }

                    curr = (*curr).successor().as_ptr();
                }

                let up = (*head).up;
                if up == head {
                    break;
                }
                head = up;
                level += 1;
            }
        }
    }
}
