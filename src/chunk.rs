//! Word-wrapping chunker

use std::collections::VecDeque;
use log::debug;

pub const DEFAULT_CHUNK_WIDTH: usize = 2000;

/// Greedy word wrap into chunks of at most `width` characters.
///
/// Every whitespace character becomes a single space, whitespace at chunk
/// edges is dropped and words longer than `width` are broken. All other
/// characters survive in their original order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker
{   width: usize
}

impl Chunker
{   pub fn new(width: usize) -> Result<Self, crate::error::Error>
    {   if width == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "chunk width must be at least 1".to_string()
            ));
        }
        Ok(Chunker { width })
    }

    pub fn width(&self) -> usize
    {   self.width
    }

    pub fn split(&self, text: &str) -> Vec<String>
    {   let mut tokens: VecDeque<Vec<char>> = tokenize(text).into();
        let mut chunks = Vec::new();

        while !tokens.is_empty()
        {   while tokens.front().is_some_and(|t| is_space(t))
            {   tokens.pop_front();
            }

            let mut line: Vec<char> = Vec::with_capacity(self.width);
            while let Some(token) = tokens.front()
            {   if line.len() + token.len() <= self.width
                {   line.extend_from_slice(token);
                    tokens.pop_front();
                } else
                {   break;
                }
            }

            if let Some(token) = tokens.front_mut()
            {   if token.len() > self.width
                {   let room = self.width - line.len();
                    let rest = token.split_off(room);
                    line.extend(token.drain(..));
                    *token = rest;
                }
            }

            while line.last() == Some(&' ')
            {   line.pop();
            }
            if !line.is_empty()
            {   chunks.push(line.into_iter().collect());
            }
        }

        debug!("Split {} chars into {} chunks", text.chars().count(), chunks.len());
        chunks
    }
}

impl Default for Chunker
{   fn default() -> Self
    {   Chunker { width: DEFAULT_CHUNK_WIDTH }
    }
}

fn is_space(token: &[char]) -> bool
{   token.first() == Some(&' ')
}

/// Alternating runs of words and (normalized) spaces
///
/// Only whitespace separates words; hyphens are not break points.
fn tokenize(text: &str) -> Vec<Vec<char>>
{   let mut tokens: Vec<Vec<char>> = Vec::new();
    for c in text.chars()
    {   let c = if c.is_whitespace() { ' ' } else { c };
        match tokens.last_mut()
        {   Some(last) if (last[0] == ' ') == (c == ' ') => last.push(c)
          , _ => tokens.push(vec![c])
        }
    }
    tokens
}
