use std::collections::BTreeSet;

use crate::error::SessionError;

/// 闪卡翻面状态
///
/// 只记录当前会话里翻到背面的闪卡索引。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlipTracker {
    revealed: BTreeSet<usize>,
}

impl FlipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 翻转第 `index` 张闪卡，返回翻转后是否显示背面
    ///
    /// `card_count` 是当前分析结果中的闪卡数量。
    pub fn toggle(&mut self, index: usize, card_count: usize) -> Result<bool, SessionError> {
        if index >= card_count {
            return Err(SessionError::FlashcardOutOfRange {
                index,
                len: card_count,
            });
        }
        if self.revealed.remove(&index) {
            Ok(false)
        } else {
            self.revealed.insert(index);
            Ok(true)
        }
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.contains(&index)
    }

    /// 当前显示背面的索引（升序）
    pub fn revealed(&self) -> impl Iterator<Item = usize> + '_ {
        self.revealed.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }

    pub fn clear(&mut self) {
        self.revealed.clear();
    }
}
