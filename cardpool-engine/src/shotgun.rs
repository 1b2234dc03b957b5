use crate::service::Cardpool;
use cardpool_core::auction::{Auction, AuctionOutcome, AuctionPhase, StarterStake};
use cardpool_core::error::LedgerError;
use cardpool_core::events::Event;
use cardpool_core::id::{AccountId, CardId};
use cardpool_core::FRACTION_SUPPLY;
use cardpool_store::LedgerStore;

/// Shotgun buy-out auctions.
///
/// A holder with at least half the supply posts a deposit that doubles as a
/// self-valuation; once every fraction is locked the purchase window opens.
/// Anyone who pays the implied full-pool price before the deadline takes the
/// whole pool and the participants split the proceeds pro rata. If nobody
/// pays, the instance times out and everything unwinds through claims.
impl<S: LedgerStore> Cardpool<S> {
    /// Bind a fresh auction instance to a fractionalized card.
    pub fn bind_auction(&self, caller: &AccountId, card_id: CardId) -> Result<(), LedgerError> {
        self.require_admin(caller)?;

        self.with_card(card_id, || {
            self.require_card(card_id)?;
            self.require_live_pool(card_id)?;
            // A resolved instance must be cleared through reset_auction first
            if self.store().get_auction(card_id)?.is_some() {
                return Err(LedgerError::AuctionPending(card_id));
            }

            self.store().put_auction(Auction::new(card_id))?;
            self.emit(Event::AuctionBound { card_id })
        })
    }

    /// Post the starter stake: lock `amount` fractions (at least half the
    /// supply) and escrow `deposit` wei as the self-valuation.
    pub fn register_starter(
        &self,
        account: &AccountId,
        card_id: CardId,
        amount: u128,
        deposit: u128,
    ) -> Result<(), LedgerError> {
        if account.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        let min_deposit = self.config()?.min_starter_deposit;
        if deposit < min_deposit {
            return Err(LedgerError::InsufficientFunds {
                needed: min_deposit,
                provided: deposit,
            });
        }
        if amount < FRACTION_SUPPLY / 2 {
            return Err(LedgerError::BelowHalfThreshold);
        }

        self.with_card(card_id, || {
            let mut auction = self.require_auction(card_id)?;
            match auction.phase {
                AuctionPhase::AwaitingStarter => {}
                AuctionPhase::Registering => {
                    return Err(LedgerError::AlreadyRegistered(card_id))
                }
                AuctionPhase::Started => return Err(LedgerError::AlreadyStarted(card_id)),
                AuctionPhase::Resolved(_) => return Err(LedgerError::AlreadyResolved(card_id)),
            }
            if auction.others.contains_key(account) {
                return Err(LedgerError::AlreadyRegistered(card_id));
            }

            let mut pool = self.require_pool(card_id)?;
            if pool.balance_of(account) < amount {
                return Err(LedgerError::InsufficientFractions);
            }

            let pot = self.auction_pot();
            pool.transfer(account, &pot, amount)?;
            self.store().put_pool(pool)?;
            self.move_value(account, &pot, deposit)?;

            auction.starter = Some(StarterStake {
                account: *account,
                amount,
                deposit,
            });
            auction.phase = AuctionPhase::Registering;
            self.store().put_auction(auction)?;

            self.emit(Event::TransferredForShotgun {
                from: *account,
                card_id,
                amount,
            })?;
            log::info!(
                "starter {account} staked {amount} fractions and {deposit} wei on card {card_id}"
            );
            Ok(())
        })
    }

    /// A non-starter holder locks `amount` fractions into the auction pot.
    ///
    /// The holder must have approved the pot as an operator first.
    pub fn register_fraction_owner(
        &self,
        account: &AccountId,
        card_id: CardId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if account.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.require_approval(account, &self.auction_pot())?;

        self.with_card(card_id, || {
            let mut auction = self.require_auction(card_id)?;
            match auction.phase {
                AuctionPhase::AwaitingStarter | AuctionPhase::Registering => {}
                AuctionPhase::Started => return Err(LedgerError::AlreadyStarted(card_id)),
                AuctionPhase::Resolved(_) => return Err(LedgerError::AlreadyResolved(card_id)),
            }
            if auction.is_participant(account) {
                return Err(LedgerError::AlreadyRegistered(card_id));
            }

            self.lock_for_auction(&mut auction, account, amount)?;
            self.store().put_auction(auction)?;
            Ok(())
        })
    }

    /// Admin batch registration: locks each owner's full pool balance.
    pub fn register_owners(
        &self,
        caller: &AccountId,
        card_id: CardId,
        owners: &[AccountId],
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;

        self.with_card(card_id, || {
            let mut auction = self.require_auction(card_id)?;
            match auction.phase {
                AuctionPhase::AwaitingStarter | AuctionPhase::Registering => {}
                AuctionPhase::Started => return Err(LedgerError::AlreadyStarted(card_id)),
                AuctionPhase::Resolved(_) => return Err(LedgerError::AlreadyResolved(card_id)),
            }

            for owner in owners {
                if owner.is_zero() {
                    return Err(LedgerError::InvalidAddress);
                }
                if auction.is_participant(owner) {
                    return Err(LedgerError::AlreadyRegistered(card_id));
                }
                let amount = self.require_pool(card_id)?.balance_of(owner);
                if amount == 0 {
                    return Err(LedgerError::InsufficientFractions);
                }
                self.lock_for_auction(&mut auction, owner, amount)?;
            }
            self.store().put_auction(auction)?;

            self.emit(Event::OtherOwnersRegistered {
                card_id,
                count: owners.len() as u64,
            })
        })
    }

    /// Open the purchase window once the entire supply is locked.
    pub fn start_auction(&self, caller: &AccountId, card_id: CardId) -> Result<u64, LedgerError> {
        self.with_card(card_id, || {
            let mut auction = self.require_auction(card_id)?;
            let starter = match (auction.phase, auction.starter) {
                (AuctionPhase::Registering, Some(starter)) => starter,
                (AuctionPhase::Started, _) => return Err(LedgerError::AlreadyStarted(card_id)),
                (AuctionPhase::Resolved(_), _) => {
                    return Err(LedgerError::AlreadyResolved(card_id))
                }
                _ => return Err(LedgerError::NotReady(card_id)),
            };
            if !auction.is_participant(caller) && *caller != self.admin()? {
                return Err(LedgerError::NotRegistered(card_id));
            }
            if auction.registered_total() != FRACTION_SUPPLY {
                return Err(LedgerError::NotReady(card_id));
            }

            let deadline = self.now() + self.config()?.auction_duration_secs;
            auction.deadline = Some(deadline);
            auction.phase = AuctionPhase::Started;
            self.store().put_auction(auction)?;

            self.emit(Event::AuctionStarted {
                card_id,
                starter: starter.account,
                amount: starter.amount,
                deadline,
            })?;
            Ok(deadline)
        })
    }

    /// Pay the posted full-pool price and take every locked fraction.
    ///
    /// First qualifying payment wins; change above the price is refunded.
    pub fn purchase_pool(
        &self,
        buyer: &AccountId,
        card_id: CardId,
        payment: u128,
    ) -> Result<u128, LedgerError> {
        if buyer.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }

        self.with_card(card_id, || {
            let mut auction = self.require_auction(card_id)?;
            match auction.phase {
                AuctionPhase::Started => {}
                AuctionPhase::Resolved(_) => return Err(LedgerError::AlreadyResolved(card_id)),
                _ => return Err(LedgerError::NotStarted(card_id)),
            }
            let deadline = auction.deadline.ok_or(LedgerError::NotStarted(card_id))?;
            if self.now() > deadline {
                return Err(LedgerError::AuctionOver(card_id));
            }
            if auction.is_participant(buyer) {
                return Err(LedgerError::AlreadyRegistered(card_id));
            }

            let price = auction.full_pool_price().ok_or(LedgerError::Overflow)?;
            if payment < price {
                return Err(LedgerError::InsufficientFunds {
                    needed: price,
                    provided: payment,
                });
            }

            let pot = self.auction_pot();
            self.debit(buyer, payment)?;
            self.credit(&pot, price)?;
            let change = payment - price;
            if change > 0 {
                self.credit(buyer, change)?;
            }

            // The pot holds the entire supply once the auction has started
            let mut pool = self.require_pool(card_id)?;
            pool.transfer(&pot, buyer, FRACTION_SUPPLY)?;
            self.store().put_pool(pool)?;

            auction.phase = AuctionPhase::Resolved(AuctionOutcome::Purchased {
                buyer: *buyer,
                payment: price,
            });
            self.store().put_auction(auction)?;

            self.emit(Event::AuctionPurchased {
                buyer: *buyer,
                card_id,
                payment: price,
            })?;
            log::info!("auction on card {card_id} purchased by {buyer} for {price} wei");
            Ok(change)
        })
    }

    /// Claim the caller's share of a resolved auction, exactly once.
    ///
    /// The first claim after the deadline of an unpurchased auction resolves
    /// it to a timeout.
    pub fn claim_proportion(&self, caller: &AccountId, card_id: CardId) -> Result<(), LedgerError> {
        self.with_card(card_id, || {
            let mut auction = self.require_auction(card_id)?;

            let outcome = match auction.phase {
                AuctionPhase::Resolved(outcome) => outcome,
                AuctionPhase::Started => {
                    let deadline = auction.deadline.ok_or(LedgerError::NotStarted(card_id))?;
                    if self.now() <= deadline {
                        return Err(LedgerError::NotOverYet(card_id));
                    }
                    auction.phase = AuctionPhase::Resolved(AuctionOutcome::TimedOut);
                    AuctionOutcome::TimedOut
                }
                _ => return Err(LedgerError::NotStarted(card_id)),
            };

            let locked = auction
                .locked_amount_of(caller)
                .ok_or(LedgerError::NotRegistered(card_id))?;
            if auction.claimed.contains(caller) {
                return Err(LedgerError::AlreadyClaimed(card_id));
            }

            let pot = self.auction_pot();
            let starter = auction.starter.filter(|s| s.account == *caller);

            match outcome {
                AuctionOutcome::Purchased { payment, .. } => {
                    let share = payment
                        .checked_mul(locked)
                        .ok_or(LedgerError::Overflow)?
                        / FRACTION_SUPPLY;
                    self.move_value(&pot, caller, share)?;
                    if let Some(stake) = starter {
                        self.move_value(&pot, caller, stake.deposit)?;
                    }

                    self.emit(Event::ProportionClaimed {
                        account: *caller,
                        card_id,
                        amount: share,
                    })?;
                }
                AuctionOutcome::TimedOut => {
                    let mut pool = self.require_pool(card_id)?;
                    pool.transfer(&pot, caller, locked)?;
                    self.store().put_pool(pool)?;

                    if let Some(stake) = starter {
                        self.move_value(&pot, caller, stake.deposit)?;
                        self.emit(Event::FractionsRefunded {
                            account: *caller,
                            card_id,
                            amount: locked,
                            deposit: stake.deposit,
                        })?;
                    } else {
                        self.emit(Event::ProportionClaimed {
                            account: *caller,
                            card_id,
                            amount: locked,
                        })?;
                    }
                }
            }

            auction.claimed.insert(*caller);
            self.store().put_auction(auction)?;
            Ok(())
        })
    }

    /// Clear an auction instance so the card can be contested again.
    ///
    /// A resolved instance is simply removed. An instance that never opened
    /// its purchase window is unwound first: registered owners get their
    /// locked fractions back and the starter additionally recovers the
    /// deposit. A started auction must resolve through purchase or timeout.
    pub fn reset_auction(&self, caller: &AccountId, card_id: CardId) -> Result<(), LedgerError> {
        self.require_admin(caller)?;

        self.with_card(card_id, || {
            let auction = self.require_auction(card_id)?;
            match auction.phase {
                AuctionPhase::Started => return Err(LedgerError::AuctionPending(card_id)),
                AuctionPhase::AwaitingStarter | AuctionPhase::Registering => {
                    let pot = self.auction_pot();
                    let mut pool = self.require_pool(card_id)?;

                    for (owner, amount) in &auction.others {
                        pool.transfer(&pot, owner, *amount)?;
                        self.emit(Event::ProportionClaimed {
                            account: *owner,
                            card_id,
                            amount: *amount,
                        })?;
                    }
                    if let Some(stake) = auction.starter {
                        pool.transfer(&pot, &stake.account, stake.amount)?;
                        self.move_value(&pot, &stake.account, stake.deposit)?;
                        self.emit(Event::FractionsRefunded {
                            account: stake.account,
                            card_id,
                            amount: stake.amount,
                            deposit: stake.deposit,
                        })?;
                    }
                    self.store().put_pool(pool)?;
                    log::info!("unwound unstarted auction on card {card_id}");
                }
                AuctionPhase::Resolved(_) => {}
            }

            self.store().remove_auction(card_id)?;
            Ok(())
        })
    }

    pub fn get_auction(&self, card_id: CardId) -> Result<Auction, LedgerError> {
        self.require_auction(card_id)
    }

    fn require_auction(&self, card_id: CardId) -> Result<Auction, LedgerError> {
        self.store()
            .get_auction(card_id)?
            .ok_or(LedgerError::NoAuction(card_id))
    }

    /// Move `amount` of `owner`'s fractions into the pot and record the
    /// registration.
    fn lock_for_auction(
        &self,
        auction: &mut Auction,
        owner: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let mut pool = self.require_pool(auction.card_id)?;
        let held = pool.balance_of(owner);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available: held,
            });
        }

        pool.transfer(owner, &self.auction_pot(), amount)?;
        self.store().put_pool(pool)?;
        auction.others.insert(*owner, amount);

        self.emit(Event::TransferredForShotgun {
            from: *owner,
            card_id: auction.card_id,
            amount,
        })
    }
}
